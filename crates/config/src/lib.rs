//! # wflambda-config
//!
//! Environment configuration for the handler wrapper.
//! This crate depends on `domain` and `shared` only.

/// Environment variable parsing.
pub mod env;
/// Effective configuration types.
pub mod schema;

pub use env::{
    ENV_FUNCTION_MEMORY_SIZE, ENV_FUNCTION_NAME, ENV_FUNCTION_VERSION, ENV_POINT_TAGS,
    ENV_REPORT_STANDARD_METRICS, EnvParseError, MAX_POINT_TAGS, WrapperEnv, is_valid_tag_key,
};
pub use schema::{DEFAULT_FUNCTION_NAME, DEFAULT_FUNCTION_VERSION, FunctionEnv, WrapperConfig};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
