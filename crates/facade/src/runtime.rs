//! `lambda_runtime` integration.

use crate::agent::WrappedHandler;
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value;
use wflambda_domain::InvocationContext;

impl WrappedHandler {
    /// Build the invocation context from the runtime's per-request context.
    pub fn context_from_lambda(&self, context: &lambda_runtime::Context) -> InvocationContext {
        self.context(
            context.request_id.as_str(),
            context.invoked_function_arn.as_str(),
        )
    }

    /// Handle one runtime event. An absent response is returned as `null`;
    /// handler errors are returned unchanged.
    pub async fn handle_event(
        &self,
        event: LambdaEvent<Value>,
    ) -> Result<Value, lambda_runtime::Error> {
        let (payload, context) = event.into_parts();
        let context = self.context_from_lambda(&context);
        match self.invoke(context, payload).await {
            Ok(response) => Ok(response.unwrap_or(Value::Null)),
            Err(error) => Err(error.into_box_error()),
        }
    }

    /// Serve invocations from the Lambda runtime API until it shuts down.
    pub async fn run(self) -> Result<(), lambda_runtime::Error> {
        lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
            let handler = self.clone();
            async move { handler.handle_event(event).await }
        }))
        .await
    }
}
