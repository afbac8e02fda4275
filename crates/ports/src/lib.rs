//! # wflambda-ports
//!
//! Port traits for the wflambda hexagonal architecture.
//!
//! The telemetry decorator talks to its collaborators (metric transport,
//! memory statistics, logging) only through these traits. This crate depends
//! only on `domain` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod logger;
pub mod memory;
pub mod metric_sender;

pub use logger::*;
pub use memory::*;
pub use metric_sender::*;

// Re-export selected domain types used in port signatures, so adapter crates
// can implement ports without directly depending on `wflambda-domain`.
pub use wflambda_domain::{MemoryStats, PointTags};
