//! Integration coverage for the payload adapter.
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wflambda_app::{BoxError, CallArg, Handler, InvocationError, ReturnValue, build};
use wflambda_domain::{
    HandlerSignature, InvocationContext, ParamShape, ReturnShape, ShapeError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u32,
    items: Vec<String>,
    express: bool,
}

#[derive(Debug, Serialize)]
struct Receipt {
    order_id: u32,
    request_id: String,
}

fn context() -> InvocationContext {
    InvocationContext::new(
        "req-42",
        "orders",
        "$LATEST",
        "arn:aws:lambda:us-west-2:123456789012:function:orders",
    )
}

#[derive(Debug)]
struct Declined;

impl std::fmt::Display for Declined {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("order declined")
    }
}

impl std::error::Error for Declined {}

#[tokio::test]
async fn context_and_payload_round_trip() -> Result<(), InvocationError> {
    let seen = Arc::new(std::sync::Mutex::new(None));
    let recorded = Arc::clone(&seen);
    let handler = Handler::with_context_payload(move |ctx: InvocationContext, order: Order| {
        let recorded = Arc::clone(&recorded);
        async move {
            if let Ok(mut slot) = recorded.lock() {
                *slot = Some(order.clone());
            }
            Ok::<_, BoxError>(Receipt {
                order_id: order.id,
                request_id: ctx.request_id().to_owned(),
            })
        }
    });

    let payload = json!({"id": 7, "items": ["a", "b"], "express": true});
    let response = build(Some(handler))(context(), payload.clone()).await?;

    assert_eq!(
        response,
        Some(json!({"order_id": 7, "request_id": "req-42"}))
    );
    let decoded = seen.lock().ok().and_then(|slot| slot.clone());
    let expected: Order = serde_json::from_value(payload).map_err(InvocationError::PayloadDecode)?;
    assert_eq!(decoded, Some(expected));
    Ok(())
}

#[tokio::test]
async fn handler_error_is_returned_unchanged() {
    let handler = Handler::with_payload(|_order: Order| async { Err::<Receipt, _>(Declined) });
    let result = build(Some(handler))(
        context(),
        json!({"id": 1, "items": [], "express": false}),
    )
    .await;

    let Err(InvocationError::Handler(error)) = result else {
        panic!("expected handler error");
    };
    assert!(error.downcast_ref::<Declined>().is_some());
    assert_eq!(error.to_string(), "order declined");
}

#[tokio::test]
async fn decode_failure_skips_the_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let handler = Handler::with_payload(move |_order: Order| {
        counted.fetch_add(1, Ordering::SeqCst);
        async { Ok::<(), BoxError>(()) }
    });

    let result = build(Some(handler))(context(), json!("not an order")).await;

    assert!(matches!(result, Err(InvocationError::PayloadDecode(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nil_handler_always_fails() {
    let callable = build(None);
    for _ in 0..2 {
        let result = callable(context(), Value::Null).await;
        let Err(error) = result else {
            panic!("expected nil handler error");
        };
        assert!(matches!(
            error,
            InvocationError::InvalidHandler(ShapeError::NilHandler)
        ));
        assert_eq!(error.to_string(), "handler is nil");
    }
}

#[tokio::test]
async fn invalid_shapes_never_invoke_user_code() {
    let calls = Arc::new(AtomicUsize::new(0));

    let too_many = {
        let calls = Arc::clone(&calls);
        Handler::dynamic(
            HandlerSignature::new(
                vec![
                    ParamShape::Context,
                    ParamShape::payload("Value"),
                    ParamShape::payload("Value"),
                ],
                Vec::new(),
            ),
            move |_args| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Vec::new() }
            },
        )
    };
    let result = build(Some(too_many))(context(), Value::Null).await;
    let Err(error) = result else {
        panic!("expected validation error");
    };
    assert_eq!(
        error.to_string(),
        "handlers may not take more than two arguments, but handler takes 3"
    );

    let single_value = {
        let calls = Arc::clone(&calls);
        Handler::dynamic(
            HandlerSignature::new(Vec::new(), vec![ReturnShape::value("String")]),
            move |_args| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Vec::new() }
            },
        )
    };
    let result = build(Some(single_value))(context(), Value::Null).await;
    assert!(matches!(
        result,
        Err(InvocationError::InvalidHandler(
            ShapeError::SingleReturnNotError
        ))
    ));

    let two_contexts = {
        let calls = Arc::clone(&calls);
        Handler::dynamic(
            HandlerSignature::new(vec![ParamShape::Context, ParamShape::Context], Vec::new()),
            move |_args| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Vec::new() }
            },
        )
    };
    let result = build(Some(two_contexts))(context(), Value::Null).await;
    assert!(matches!(
        result,
        Err(InvocationError::InvalidHandler(
            ShapeError::SecondArgumentNotPayload
        ))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn returns_outside_the_declared_shape_fail() {
    let silent = Handler::dynamic(HandlerSignature::default(), |_args| async {
        vec![ReturnValue::Error(Some("surprise".into()))]
    });
    let result = build(Some(silent))(context(), Value::Null).await;
    let Err(error) = result else {
        panic!("expected return mismatch");
    };
    assert_eq!(error.kind(), "return_mismatch");
    assert_ne!(error.to_string(), "surprise");

    let error_only = Handler::dynamic(
        HandlerSignature::new(Vec::new(), vec![ReturnShape::Error]),
        |_args| async {
            vec![
                ReturnValue::Value(Ok(Value::from(5))),
                ReturnValue::Error(None),
            ]
        },
    );
    let result = build(Some(error_only))(context(), Value::Null).await;
    assert!(matches!(
        result,
        Err(InvocationError::ReturnMismatch {
            declared: 1,
            returned: 2
        })
    ));
}

#[tokio::test]
async fn dynamic_handlers_receive_generic_payloads() -> Result<(), InvocationError> {
    let handler = Handler::dynamic(
        HandlerSignature::new(
            vec![ParamShape::Context, ParamShape::payload("Value")],
            vec![ReturnShape::value("Value"), ReturnShape::Error],
        ),
        |args: Vec<CallArg>| async move {
            let mut args = args.into_iter();
            let (Some(CallArg::Context(ctx)), Some(CallArg::Payload(payload))) =
                (args.next(), args.next())
            else {
                return vec![ReturnValue::Error(Some("bad arguments".into()))];
            };
            let payload = payload.downcast::<Value>().map(|value| *value).unwrap_or_default();
            vec![
                ReturnValue::Value(Ok(json!({
                    "echo": payload,
                    "function": ctx.function_name(),
                }))),
                ReturnValue::Error(None),
            ]
        },
    );

    let response = build(Some(handler))(context(), json!({"ping": 1})).await?;
    assert_eq!(
        response,
        Some(json!({"echo": {"ping": 1}, "function": "orders"}))
    );
    Ok(())
}

#[tokio::test]
async fn zero_return_handlers_yield_no_response() -> Result<(), InvocationError> {
    let handler = Handler::with_context(|_ctx| async {});
    let response = build(Some(handler))(context(), json!({"ignored": true})).await?;
    assert_eq!(response, None);
    Ok(())
}
