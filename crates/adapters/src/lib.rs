//! # wflambda-adapters
//!
//! Concrete implementations of the wflambda ports: a JSON-line metric sender,
//! `/proc/meminfo` memory statistics, and a `tracing` logger.
//! This crate depends on `ports` and `shared`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod log_sink;
pub mod logger;
pub mod memory;
pub mod sender;

pub use log_sink::{LineSink, StdoutLineSink};
pub use logger::TracingLogger;
pub use memory::{PROC_MEMINFO, ProcMemoryStats, parse_meminfo};
pub use sender::{DEFAULT_BUFFER_CAPACITY, JsonLineSender};

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wflambda_ports::ports_crate_version;
    use wflambda_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("wflambda") {
                let key = line.split('=').next().unwrap_or("").trim();
                deps.push(key.split('.').next().unwrap_or("").trim().to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_facade() {
        let deps = workspace_deps();
        assert!(!deps.is_empty());
        for dep in &deps {
            assert!(
                !["wflambda-app", "wflambda"].contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }

    #[test]
    fn adapters_can_use_ports_and_shared() {
        assert!(!adapters_crate_version().is_empty());
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
