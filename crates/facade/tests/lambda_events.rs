//! Integration coverage for runtime events flowing through a wrapped handler.
#![cfg(feature = "lambda-runtime")]
#![allow(missing_docs)]

use lambda_runtime::{Context, LambdaEvent};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use wflambda::{Agent, BoxError, FunctionEnv, Handler, InvocationContext, WrapperConfig, WrapperDeps};
use wflambda_testkit::{FixedMemoryStats, RecordingSender, SenderCall};

const ARN: &str = "arn:aws:lambda:eu-central-1:210987654321:function:greeter:live";

#[derive(Debug, Deserialize)]
struct Greeting {
    name: String,
}

fn agent(sender: Arc<RecordingSender>) -> Agent {
    let config = WrapperConfig {
        function: FunctionEnv {
            name: "greeter".into(),
            version: "12".into(),
            memory_size_mb: Some(128),
        },
        ..WrapperConfig::default()
    };
    Agent::new(
        config,
        WrapperDeps {
            sender,
            memory: Arc::new(FixedMemoryStats::from_totals(128, 64)),
            logger: None,
        },
    )
}

fn event(payload: Value) -> LambdaEvent<Value> {
    let mut context = Context::default();
    context.request_id = "req-77".to_owned();
    context.invoked_function_arn = ARN.to_owned();
    LambdaEvent::new(payload, context)
}

#[tokio::test]
async fn events_are_adapted_and_reported() -> Result<(), lambda_runtime::Error> {
    let sender = Arc::new(RecordingSender::new());
    let handler = agent(Arc::clone(&sender)).wrap(Handler::with_context_payload(
        |ctx: InvocationContext, greeting: Greeting| async move {
            Ok::<_, BoxError>(json!({
                "message": format!("hello {}", greeting.name),
                "requestId": ctx.request_id(),
                "version": ctx.function_version(),
            }))
        },
    ));

    let response = handler.handle_event(event(json!({"name": "ada"}))).await?;

    assert_eq!(
        response,
        json!({"message": "hello ada", "requestId": "req-77", "version": "12"})
    );
    let Some(tags) = sender.first_tags() else {
        panic!("expected tagged metrics");
    };
    assert_eq!(tags.get("Resource").map(AsRef::as_ref), Some("greeter:live"));
    assert_eq!(tags.get("accountId").map(AsRef::as_ref), Some("210987654321"));
    assert_eq!(tags.get("ExecutedVersion").map(AsRef::as_ref), Some("12"));
    assert_eq!(tags.get("FunctionMemorySize").map(AsRef::as_ref), Some("128"));
    let calls = sender.calls();
    assert_eq!(calls.last(), Some(&SenderCall::Close));
    Ok(())
}

#[tokio::test]
async fn absent_responses_become_null() -> Result<(), lambda_runtime::Error> {
    let sender = Arc::new(RecordingSender::new());
    let handler = agent(sender).wrap(Handler::with_payload(|_payload: Value| async {
        Ok::<(), BoxError>(())
    }));

    let response = handler.handle_event(event(json!(1))).await?;

    assert_eq!(response, Value::Null);
    Ok(())
}

#[tokio::test]
async fn handler_errors_reach_the_runtime_unchanged() {
    let sender = Arc::new(RecordingSender::new());
    let handler = agent(Arc::clone(&sender)).wrap(Handler::from_fn(|| async {
        Err::<Value, _>(std::io::Error::other("upstream timeout"))
    }));

    let Err(error) = handler.handle_event(event(Value::Null)).await else {
        panic!("expected handler error");
    };

    assert!(error.downcast_ref::<std::io::Error>().is_some());
    assert_eq!(error.to_string(), "upstream timeout");
    assert_eq!(sender.delta("aws.lambda.wf.errors"), Some(1));
}

#[tokio::test]
async fn nil_handler_fails_every_event() {
    let handler = agent(Arc::new(RecordingSender::new())).wrap_optional(None);

    for _ in 0..2 {
        let Err(error) = handler.handle_event(event(Value::Null)).await else {
            panic!("expected nil handler error");
        };
        assert_eq!(error.to_string(), "handler is nil");
    }
}
