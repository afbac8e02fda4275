//! Payload adapter: builds the fixed-signature callable from a handler.

use crate::handler::{BoxError, CallArg, Handler, ReturnValue};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use wflambda_domain::{HandlerDescriptor, InvocationContext, ShapeError, describe};
use wflambda_shared::{ErrorCode, ErrorEnvelope};

/// Response (absent when the handler produces none) or invocation error.
pub type InvocationResult = Result<Option<Value>, InvocationError>;

/// Fixed-signature callable produced by [`build`].
pub type LambdaHandler =
    Arc<dyn Fn(InvocationContext, Value) -> BoxFuture<'static, InvocationResult> + Send + Sync>;

/// Failure of a single invocation.
#[derive(Debug)]
pub enum InvocationError {
    /// The handler failed wrap-time validation; every call fails the same way.
    InvalidHandler(ShapeError),
    /// The payload could not be decoded into the handler's declared type.
    PayloadDecode(serde_json::Error),
    /// The handler's response could not be encoded as JSON.
    ResponseEncode(serde_json::Error),
    /// The handler returned slots that differ from its declared returns.
    ReturnMismatch {
        /// Declared return count.
        declared: usize,
        /// Slots actually returned.
        returned: usize,
    },
    /// The handler's own error, unchanged.
    Handler(BoxError),
}

impl InvocationError {
    /// Convert into a boxed error, returning handler errors as-is.
    #[must_use]
    pub fn into_box_error(self) -> BoxError {
        match self {
            Self::Handler(error) => error,
            other => Box::new(other),
        }
    }

    /// Stable kind label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidHandler(_) => "invalid_handler",
            Self::PayloadDecode(_) => "payload_decode",
            Self::ResponseEncode(_) => "response_encode",
            Self::ReturnMismatch { .. } => "return_mismatch",
            Self::Handler(_) => "handler",
        }
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHandler(error) => write!(formatter, "{error}"),
            Self::PayloadDecode(error) | Self::ResponseEncode(error) => {
                write!(formatter, "{error}")
            },
            Self::ReturnMismatch { declared, returned } => write!(
                formatter,
                "handler returned {returned} values that do not match its {declared} declared \
                 returns"
            ),
            Self::Handler(error) => write!(formatter, "{error}"),
        }
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidHandler(error) => Some(error),
            Self::PayloadDecode(error) | Self::ResponseEncode(error) => Some(error),
            Self::ReturnMismatch { .. } => None,
            Self::Handler(error) => Some(error.as_ref()),
        }
    }
}

impl From<&InvocationError> for ErrorEnvelope {
    fn from(error: &InvocationError) -> Self {
        match error {
            InvocationError::InvalidHandler(shape) => shape.clone().into(),
            InvocationError::ReturnMismatch { declared, returned } => Self::invariant(
                ErrorCode::new("handler", error.kind()),
                error.to_string(),
            )
            .with_metadata("declared", declared.to_string())
            .with_metadata("returned", returned.to_string()),
            other => Self::expected(ErrorCode::new("handler", other.kind()), other.to_string()),
        }
    }
}

/// Build the fixed-signature callable for `handler`.
///
/// An absent handler or one whose shape fails validation yields a callable
/// that always fails with that error and never runs user code.
pub fn build(handler: Option<Handler>) -> LambdaHandler {
    let Some(handler) = handler else {
        return failing(ShapeError::NilHandler);
    };
    let descriptor = match describe(handler.signature()) {
        Ok(descriptor) => descriptor,
        Err(error) => return failing(error),
    };

    let adapted = Arc::new(Adapted {
        handler,
        descriptor,
    });
    Arc::new(move |context, payload| -> BoxFuture<'static, InvocationResult> {
        let adapted = Arc::clone(&adapted);
        Box::pin(async move { adapted.invoke(context, payload).await })
    })
}

struct Adapted {
    handler: Handler,
    descriptor: HandlerDescriptor,
}

impl Adapted {
    async fn invoke(&self, context: InvocationContext, payload: Value) -> InvocationResult {
        let mut args = Vec::with_capacity(self.descriptor.argument_count());
        if self.descriptor.takes_context() {
            args.push(CallArg::Context(context));
        }
        if self.descriptor.takes_payload() {
            let bytes = serde_json::to_vec(&payload).map_err(InvocationError::PayloadDecode)?;
            let decoded = self
                .handler
                .decode_payload(&bytes)
                .map_err(InvocationError::PayloadDecode)?;
            args.push(CallArg::Payload(decoded));
        }

        normalize(&self.descriptor, self.handler.call(args).await)
    }
}

fn failing(error: ShapeError) -> LambdaHandler {
    Arc::new(move |_context, _payload| -> BoxFuture<'static, InvocationResult> {
        let error = error.clone();
        Box::pin(async move { Err(InvocationError::InvalidHandler(error)) })
    })
}

/// Normalize positional return slots into a response and error.
///
/// Slots are read by the declared returns: one slot is the error, two are
/// the response followed by the error. Slots that do not match the
/// declaration fail with [`InvocationError::ReturnMismatch`] before any
/// handler error is inspected.
pub fn normalize(descriptor: &HandlerDescriptor, returns: Vec<ReturnValue>) -> InvocationResult {
    let declared = descriptor.return_arity();
    let returned = returns.len();
    let mismatch = || InvocationError::ReturnMismatch { declared, returned };

    let mut slots = returns.into_iter();
    let (response, error) = match (declared, slots.next(), slots.next(), slots.next()) {
        (0, None, None, None) => (None, None),
        (1, Some(ReturnValue::Error(error)), None, None) if descriptor.returns_error() => {
            (None, error)
        },
        (2, Some(ReturnValue::Value(value)), Some(ReturnValue::Error(error)), None)
            if descriptor.returns_value() =>
        {
            (Some(value), error)
        },
        _ => return Err(mismatch()),
    };

    if let Some(error) = error {
        return Err(InvocationError::Handler(error));
    }
    response
        .transpose()
        .map_err(InvocationError::ResponseEncode)
}
