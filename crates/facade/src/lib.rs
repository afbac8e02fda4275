//! # wflambda
//!
//! Wrap AWS Lambda handlers with automatic telemetry: invocation and error
//! counts, cold starts, duration, and memory usage, reported on every exit
//! path including panics.
//!
//! ```no_run
//! use wflambda::{Agent, BoxError, Handler, InvocationContext};
//!
//! # async fn serve() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! wflambda::init_tracing()?;
//! let agent = Agent::from_env()?;
//! let handler = agent.wrap(Handler::with_context_payload(
//!     |ctx: InvocationContext, name: String| async move {
//!         Ok::<_, BoxError>(format!("hello {name} from {}", ctx.function_name()))
//!     },
//! ));
//! # #[cfg(feature = "lambda-runtime")]
//! handler.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! This crate depends on every other wflambda crate.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod agent;
#[cfg(feature = "lambda-runtime")]
mod runtime;
mod tracing_init;

pub use agent::{Agent, WrappedHandler};
pub use tracing_init::{DEFAULT_LOG_FILTER, init_tracing, init_tracing_with_filter};

pub use wflambda_adapters::{
    JsonLineSender, LineSink, ProcMemoryStats, StdoutLineSink, TracingLogger,
};
pub use wflambda_app::{
    BoxError, CallArg, CounterSnapshot, Handler, HandlerOutput, InvocationCounters,
    InvocationError, InvocationResult, ReturnValue, WrapperDeps,
};
pub use wflambda_config::{FunctionEnv, WrapperConfig};
pub use wflambda_domain::{
    HandlerSignature, InvocationContext, MemoryStats, ParamShape, PointTags, ReturnShape,
    ShapeError,
};
pub use wflambda_ports::{LoggerPort, MemoryStatsPort, MetricSenderPort};
pub use wflambda_shared::{ErrorEnvelope, Result};

/// Returns the facade crate version.
#[must_use]
pub const fn facade_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
