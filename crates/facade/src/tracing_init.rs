//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use wflambda_shared::{ErrorCode, ErrorEnvelope, Result};

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a JSON subscriber filtered by `RUST_LOG` (default `info`).
///
/// Lambda forwards stdout to CloudWatch Logs, so events are flattened into
/// one JSON object per line.
pub fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    install(filter)
}

/// Install a JSON subscriber with explicit filter directives.
pub fn init_tracing_with_filter(directives: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directives).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            format!("invalid log filter: {error}"),
        )
        .with_metadata("directives", directives)
    })?;
    install(filter)
}

fn install(filter: EnvFilter) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_target(false))
        .try_init()
        .map_err(|error| {
            ErrorEnvelope::invariant(
                ErrorCode::new("tracing", "already_initialized"),
                error.to_string(),
            )
        })
}
