//! Handler shapes and the wrap-time validator.
//!
//! A handler is described by an ordered list of parameter shapes and an
//! ordered list of return shapes. Typed handlers derive their signature from
//! the closure type; dynamic handlers supply one explicitly. The validator runs
//! once per wrap and yields an immutable [`HandlerDescriptor`].

use serde::{Deserialize, Serialize};
use std::fmt;
use wflambda_shared::{ErrorCode, ErrorEnvelope};

const MAX_ARGUMENTS: usize = 2;
const MAX_RETURNS: usize = 2;

/// Shape of a single handler parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum ParamShape {
    /// The invocation context.
    Context,
    /// A payload decoded from JSON into `type_name`.
    Payload {
        /// Declared payload type.
        type_name: Box<str>,
    },
}

impl ParamShape {
    /// Payload parameter for the given type name.
    pub fn payload(type_name: impl Into<Box<str>>) -> Self {
        Self::Payload {
            type_name: type_name.into(),
        }
    }

    /// Returns true for the context shape.
    #[must_use]
    pub const fn is_context(&self) -> bool {
        matches!(self, Self::Context)
    }

    fn type_name(&self) -> &str {
        match self {
            Self::Context => "Context",
            Self::Payload { type_name } => type_name,
        }
    }
}

/// Shape of a single handler return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum ReturnShape {
    /// An ordinary response value.
    Value {
        /// Declared response type.
        type_name: Box<str>,
    },
    /// An error-capable value.
    Error,
}

impl ReturnShape {
    /// Value return for the given type name.
    pub fn value(type_name: impl Into<Box<str>>) -> Self {
        Self::Value {
            type_name: type_name.into(),
        }
    }

    /// Returns true for the error shape.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Ordered parameter and return shapes of a handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSignature {
    params: Vec<ParamShape>,
    returns: Vec<ReturnShape>,
}

impl HandlerSignature {
    /// Build a signature from explicit shapes.
    #[must_use]
    pub const fn new(params: Vec<ParamShape>, returns: Vec<ReturnShape>) -> Self {
        Self { params, returns }
    }

    /// Parameter shapes in call order.
    #[must_use]
    pub fn params(&self) -> &[ParamShape] {
        &self.params
    }

    /// Return shapes in declaration order.
    #[must_use]
    pub fn returns(&self) -> &[ReturnShape] {
        &self.returns
    }
}

/// Validated handler description, built once at wrap time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerDescriptor {
    argument_count: usize,
    takes_context: bool,
    payload_type: Option<Box<str>>,
    return_arity: usize,
    returns_error: bool,
}

impl HandlerDescriptor {
    /// Number of parameters (0..=2).
    #[must_use]
    pub const fn argument_count(&self) -> usize {
        self.argument_count
    }

    /// Whether the first parameter is the context.
    #[must_use]
    pub const fn takes_context(&self) -> bool {
        self.takes_context
    }

    /// Declared payload type, if the handler takes a payload.
    #[must_use]
    pub fn payload_type(&self) -> Option<&str> {
        self.payload_type.as_deref()
    }

    /// Whether a payload must be decoded before the call.
    #[must_use]
    pub const fn takes_payload(&self) -> bool {
        self.payload_type.is_some()
    }

    /// Number of return values (0..=2).
    #[must_use]
    pub const fn return_arity(&self) -> usize {
        self.return_arity
    }

    /// Whether the last return value is error-capable.
    #[must_use]
    pub const fn returns_error(&self) -> bool {
        self.returns_error
    }

    /// Whether the handler produces a response value.
    #[must_use]
    pub const fn returns_value(&self) -> bool {
        self.return_arity == MAX_RETURNS
    }
}

/// Reasons a handler cannot be wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// No handler was supplied.
    NilHandler,
    /// More than two parameters.
    TooManyArguments {
        /// Declared parameter count.
        count: usize,
    },
    /// Two parameters, but the first is not the context.
    FirstArgumentNotContext {
        /// Declared type of the first parameter.
        found: Box<str>,
    },
    /// Two parameters, but the second is not a payload.
    SecondArgumentNotPayload,
    /// More than two return values.
    TooManyReturns {
        /// Declared return count.
        count: usize,
    },
    /// Two return values, but the second is not error-capable.
    SecondReturnNotError,
    /// A single return value that is not error-capable.
    SingleReturnNotError,
}

impl ShapeError {
    const fn code(&self) -> &'static str {
        match self {
            Self::NilHandler => "nil_handler",
            Self::TooManyArguments { .. } => "too_many_arguments",
            Self::FirstArgumentNotContext { .. } => "first_argument_not_context",
            Self::SecondArgumentNotPayload => "second_argument_not_payload",
            Self::TooManyReturns { .. } => "too_many_returns",
            Self::SecondReturnNotError => "second_return_not_error",
            Self::SingleReturnNotError => "single_return_not_error",
        }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NilHandler => formatter.write_str("handler is nil"),
            Self::TooManyArguments { count } => write!(
                formatter,
                "handlers may not take more than two arguments, but handler takes {count}"
            ),
            Self::FirstArgumentNotContext { found } => write!(
                formatter,
                "handler takes two arguments, but the first is not Context. got {found}"
            ),
            Self::SecondArgumentNotPayload => formatter
                .write_str("handler takes two arguments, but the second is not a payload"),
            Self::TooManyReturns { .. } => {
                formatter.write_str("handler may not return more than two values")
            },
            Self::SecondReturnNotError => formatter
                .write_str("handler returns two values, but the second does not implement error"),
            Self::SingleReturnNotError => formatter
                .write_str("handler returns a single value, but it does not implement error"),
        }
    }
}

impl std::error::Error for ShapeError {}

impl From<ShapeError> for ErrorEnvelope {
    fn from(error: ShapeError) -> Self {
        let envelope = Self::expected(ErrorCode::new("handler", error.code()), error.to_string());
        match error {
            ShapeError::TooManyArguments { count } | ShapeError::TooManyReturns { count } => {
                envelope.with_metadata("count", count.to_string())
            },
            ShapeError::FirstArgumentNotContext { found } => {
                envelope.with_metadata("found", found.into_string())
            },
            ShapeError::NilHandler
            | ShapeError::SecondArgumentNotPayload
            | ShapeError::SecondReturnNotError
            | ShapeError::SingleReturnNotError => envelope,
        }
    }
}

/// Check parameter shapes and report whether the handler takes a context.
pub fn validate_arguments(signature: &HandlerSignature) -> Result<bool, ShapeError> {
    let params = signature.params();
    if params.len() > MAX_ARGUMENTS {
        return Err(ShapeError::TooManyArguments {
            count: params.len(),
        });
    }

    let Some(first) = params.first() else {
        return Ok(false);
    };
    let takes_context = first.is_context();
    if params.len() == MAX_ARGUMENTS && !takes_context {
        return Err(ShapeError::FirstArgumentNotContext {
            found: first.type_name().into(),
        });
    }
    if params.get(1).is_some_and(ParamShape::is_context) {
        return Err(ShapeError::SecondArgumentNotPayload);
    }
    Ok(takes_context)
}

/// Check return shapes.
pub fn validate_returns(signature: &HandlerSignature) -> Result<(), ShapeError> {
    match signature.returns() {
        [] => Ok(()),
        [single] if single.is_error() => Ok(()),
        [_] => Err(ShapeError::SingleReturnNotError),
        [_, second] if second.is_error() => Ok(()),
        [_, _] => Err(ShapeError::SecondReturnNotError),
        returns => Err(ShapeError::TooManyReturns {
            count: returns.len(),
        }),
    }
}

/// Validate a signature and build its descriptor.
pub fn describe(signature: &HandlerSignature) -> Result<HandlerDescriptor, ShapeError> {
    let takes_context = validate_arguments(signature)?;
    validate_returns(signature)?;

    let payload_slot = usize::from(takes_context);
    let payload_type = match signature.params().get(payload_slot) {
        Some(ParamShape::Payload { type_name }) => Some(type_name.clone()),
        Some(ParamShape::Context) | None => None,
    };
    let returns = signature.returns();

    Ok(HandlerDescriptor {
        argument_count: signature.params().len(),
        takes_context,
        payload_type,
        return_arity: returns.len(),
        returns_error: returns.last().is_some_and(ReturnShape::is_error),
    })
}
