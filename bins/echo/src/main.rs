//! Lambda bootstrap: echoes the payload back with invocation identity.

use serde_json::{Value, json};
use wflambda::{Agent, BoxError, Handler, InvocationContext};

async fn echo(context: InvocationContext, payload: Value) -> Result<Value, BoxError> {
    Ok(json!({
        "requestId": context.request_id(),
        "function": context.function_name(),
        "payload": payload,
    }))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    wflambda::init_tracing()?;
    let agent = Agent::from_env()?;
    agent.wrap(Handler::with_context_payload(echo)).run().await
}
