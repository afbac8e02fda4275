//! # wflambda-app
//!
//! Handler adaptation and invocation telemetry.
//! This crate depends on `ports`, `domain`, and `shared`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod counters;
pub mod handler;
pub mod payload;
pub mod wrapper;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use counters::{CounterSnapshot, DeltaCounter, InvocationCounters};
pub use handler::{BoxError, CallArg, ErasedPayload, Handler, HandlerOutput, ReturnValue};
pub use payload::{InvocationError, InvocationResult, LambdaHandler, build, normalize};
pub use wrapper::{HandlerWrapper, InvocationOutcome, WrapperDeps, WrapperSettings};
