//! # wflambda-domain
//!
//! Domain model for the Lambda handler wrapper:
//!
//! - **Context** - `InvocationContext` (per-invocation identity)
//! - **ARN** - `InvokedArn`, `ArnResource` parsed from the invoked function ARN
//! - **Tags** - `PointTags` and identity tag resolution
//! - **Signature** - `HandlerSignature`, `HandlerDescriptor`, and the shape validator
//! - **Metrics** - metric names, `MemoryStats`, `InvocationMetrics`
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use wflambda_shared::shared_crate_version;

// =============================================================================
// DOMAIN MODULES
// =============================================================================

pub mod arn;
pub mod context;
pub mod metrics;
pub mod signature;
pub mod tags;

pub use arn::{ArnError, ArnResource, InvokedArn};
pub use context::InvocationContext;
pub use metrics::{
    CounterDeltas, InvocationMetrics, METRIC_COLD_STARTS, METRIC_DURATION, METRIC_ERRORS,
    METRIC_INVOCATIONS, METRIC_MEM_PERCENTAGE, METRIC_MEM_TOTAL, METRIC_MEM_USED, MemoryStats,
};
pub use signature::{
    HandlerDescriptor, HandlerSignature, ParamShape, ReturnShape, ShapeError, describe,
    validate_arguments, validate_returns,
};
pub use tags::{
    PointTags, ResolvedTags, TAG_ACCOUNT_ID, TAG_EVENT_SOURCE_MAPPINGS, TAG_EXECUTED_VERSION,
    TAG_FUNCTION_NAME, TAG_LAMBDA_ARN, TAG_MEMORY_SIZE, TAG_REGION, TAG_RESOURCE, TAG_SOURCE,
    resolve_point_tags,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
