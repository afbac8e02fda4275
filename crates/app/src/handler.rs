//! Type-erased user handlers.
//!
//! A [`Handler`] pairs a [`HandlerSignature`] with two erased operations: a
//! payload decoder and a call that receives positional arguments and yields
//! positional return slots. Typed constructors derive all three from the
//! closure type, so the shape validator sees exactly what the closure accepts.

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use wflambda_domain::{HandlerSignature, InvocationContext, ParamShape, ReturnShape};
use wflambda_shared::{ErrorCode, ErrorEnvelope};

/// Error type returned by user handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Decoded payload, erased to the handler's declared type.
pub type ErasedPayload = Box<dyn Any + Send>;

type DecodeFn = dyn Fn(&[u8]) -> Result<ErasedPayload, serde_json::Error> + Send + Sync;
type CallFn = dyn Fn(Vec<CallArg>) -> BoxFuture<'static, Vec<ReturnValue>> + Send + Sync;

/// Positional argument passed to a handler.
pub enum CallArg {
    /// The invocation context.
    Context(InvocationContext),
    /// The decoded payload.
    Payload(ErasedPayload),
}

impl fmt::Debug for CallArg {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(context) => formatter.debug_tuple("Context").field(context).finish(),
            Self::Payload(_) => formatter.write_str("Payload(..)"),
        }
    }
}

/// Positional return slot produced by a handler.
#[derive(Debug)]
pub enum ReturnValue {
    /// An ordinary response, already encoded as JSON.
    Value(Result<Value, serde_json::Error>),
    /// An error-capable slot; `None` when the handler signalled no error.
    Error(Option<BoxError>),
}

/// Output types accepted from typed handler futures.
///
/// `()` declares no return values, `Result<(), E>` a single error, and
/// `Result<R, E>` a response plus an error.
pub trait HandlerOutput: Send + 'static {
    /// Declared return shapes.
    fn return_shapes() -> Vec<ReturnShape>;

    /// Split the output into positional return slots.
    fn into_returns(self) -> Vec<ReturnValue>;
}

impl HandlerOutput for () {
    fn return_shapes() -> Vec<ReturnShape> {
        Vec::new()
    }

    fn into_returns(self) -> Vec<ReturnValue> {
        Vec::new()
    }
}

impl<R, E> HandlerOutput for Result<R, E>
where
    R: Serialize + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn return_shapes() -> Vec<ReturnShape> {
        if is_unit::<R>() {
            vec![ReturnShape::Error]
        } else {
            vec![ReturnShape::value(type_name::<R>()), ReturnShape::Error]
        }
    }

    fn into_returns(self) -> Vec<ReturnValue> {
        let unit = is_unit::<R>();
        match self {
            Ok(_) if unit => vec![ReturnValue::Error(None)],
            Err(error) if unit => vec![ReturnValue::Error(Some(error.into()))],
            Ok(response) => vec![
                ReturnValue::Value(serde_json::to_value(response)),
                ReturnValue::Error(None),
            ],
            Err(error) => vec![
                ReturnValue::Value(Ok(Value::Null)),
                ReturnValue::Error(Some(error.into())),
            ],
        }
    }
}

fn is_unit<R: 'static>() -> bool {
    TypeId::of::<R>() == TypeId::of::<()>()
}

/// A user function with its declared shape.
#[derive(Clone)]
pub struct Handler {
    signature: HandlerSignature,
    decode: Arc<DecodeFn>,
    call: Arc<CallFn>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Handler")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// Handler taking no arguments.
    pub fn from_fn<F, Fut>(handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutput,
    {
        Self::typed::<(), Fut::Output, _>(Vec::new(), move |_args| {
            let future = handler();
            Box::pin(async move { future.await.into_returns() })
        })
    }

    /// Handler taking only the invocation context.
    pub fn with_context<F, Fut>(handler: F) -> Self
    where
        F: Fn(InvocationContext) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutput,
    {
        Self::typed::<(), Fut::Output, _>(vec![ParamShape::Context], move |args| {
            let Some(CallArg::Context(context)) = args.into_iter().next() else {
                return mismatched_arguments();
            };
            let future = handler(context);
            Box::pin(async move { future.await.into_returns() })
        })
    }

    /// Handler taking only a payload of type `T`.
    pub fn with_payload<T, F, Fut>(handler: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutput,
    {
        let params = vec![ParamShape::payload(type_name::<T>())];
        Self::typed::<T, Fut::Output, _>(params, move |args| {
            let Some(CallArg::Payload(payload)) = args.into_iter().next() else {
                return mismatched_arguments();
            };
            let Ok(payload) = payload.downcast::<T>() else {
                return mismatched_arguments();
            };
            let future = handler(*payload);
            Box::pin(async move { future.await.into_returns() })
        })
    }

    /// Handler taking the invocation context and a payload of type `T`.
    pub fn with_context_payload<T, F, Fut>(handler: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(InvocationContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutput,
    {
        let params = vec![ParamShape::Context, ParamShape::payload(type_name::<T>())];
        Self::typed::<T, Fut::Output, _>(params, move |args| {
            let mut args = args.into_iter();
            let (Some(CallArg::Context(context)), Some(CallArg::Payload(payload))) =
                (args.next(), args.next())
            else {
                return mismatched_arguments();
            };
            let Ok(payload) = payload.downcast::<T>() else {
                return mismatched_arguments();
            };
            let future = handler(context, *payload);
            Box::pin(async move { future.await.into_returns() })
        })
    }

    /// Handler described at runtime.
    ///
    /// The signature is validated at wrap time like any other; payload
    /// parameters decode to [`serde_json::Value`].
    pub fn dynamic<F, Fut>(signature: HandlerSignature, handler: F) -> Self
    where
        F: Fn(Vec<CallArg>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<ReturnValue>> + Send + 'static,
    {
        Self {
            signature,
            decode: Arc::new(decode_as::<Value>),
            call: Arc::new(move |args| -> BoxFuture<'static, Vec<ReturnValue>> {
                Box::pin(handler(args))
            }),
        }
    }

    fn typed<T, O, C>(params: Vec<ParamShape>, call: C) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        O: HandlerOutput,
        C: Fn(Vec<CallArg>) -> BoxFuture<'static, Vec<ReturnValue>> + Send + Sync + 'static,
    {
        Self {
            signature: HandlerSignature::new(params, O::return_shapes()),
            decode: Arc::new(decode_as::<T>),
            call: Arc::new(call),
        }
    }

    /// Declared shape.
    #[must_use]
    pub const fn signature(&self) -> &HandlerSignature {
        &self.signature
    }

    /// Decode canonical JSON bytes into the declared payload type.
    pub fn decode_payload(&self, bytes: &[u8]) -> Result<ErasedPayload, serde_json::Error> {
        (self.decode)(bytes)
    }

    /// Call the handler with positional arguments.
    pub fn call(&self, args: Vec<CallArg>) -> BoxFuture<'static, Vec<ReturnValue>> {
        (self.call)(args)
    }
}

fn decode_as<T>(bytes: &[u8]) -> Result<ErasedPayload, serde_json::Error>
where
    T: DeserializeOwned + Send + 'static,
{
    let decoded: T = serde_json::from_slice(bytes)?;
    Ok(Box::new(decoded))
}

fn mismatched_arguments() -> BoxFuture<'static, Vec<ReturnValue>> {
    let error = ErrorEnvelope::invariant(
        ErrorCode::new("handler", "argument_mismatch"),
        "handler received arguments that do not match its signature",
    );
    Box::pin(async move { vec![ReturnValue::Error(Some(error.into()))] })
}
