//! `/proc/meminfo` memory statistics.

use std::path::PathBuf;
use wflambda_ports::{MemoryStats, MemoryStatsPort};
use wflambda_shared::{ErrorCode, ErrorEnvelope, Result};

/// Default location of the kernel memory report.
pub const PROC_MEMINFO: &str = "/proc/meminfo";

/// Memory statistics read from a meminfo-formatted file.
#[derive(Debug, Clone)]
pub struct ProcMemoryStats {
    path: PathBuf,
}

impl Default for ProcMemoryStats {
    fn default() -> Self {
        Self::new(PROC_MEMINFO)
    }
}

impl ProcMemoryStats {
    /// Read statistics from `path` instead of [`PROC_MEMINFO`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MemoryStatsPort for ProcMemoryStats {
    fn memory_stats(&self) -> Result<MemoryStats> {
        let content = std::fs::read_to_string(&self.path).map_err(|error| {
            ErrorEnvelope::from(error).with_metadata("path", self.path.display().to_string())
        })?;
        parse_meminfo(&content)
    }
}

/// Parse `MemTotal` and `MemAvailable` (kB) into byte-based statistics.
///
/// Falls back to `MemFree` when `MemAvailable` is absent (pre-3.14 kernels).
pub fn parse_meminfo(content: &str) -> Result<MemoryStats> {
    let mut total = None;
    let mut available = None;
    let mut free = None;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let slot = match key.trim() {
            "MemTotal" => &mut total,
            "MemAvailable" => &mut available,
            "MemFree" => &mut free,
            _ => continue,
        };
        *slot = Some(parse_kib(key, rest)?);
    }

    let total = total.ok_or_else(|| missing_field("MemTotal"))?;
    let available = available
        .or(free)
        .ok_or_else(|| missing_field("MemAvailable"))?;
    Ok(MemoryStats::from_totals(total, available))
}

fn parse_kib(key: &str, rest: &str) -> Result<u64> {
    let value = rest.split_whitespace().next().unwrap_or_default();
    value
        .parse::<u64>()
        .map(|kib| kib.saturating_mul(1024))
        .map_err(|_| {
            ErrorEnvelope::expected(
                ErrorCode::new("memory", "invalid_meminfo"),
                format!("meminfo field {key} is not a number"),
            )
            .with_metadata("field", key.trim())
            .with_metadata("value", value)
        })
}

fn missing_field(field: &str) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("memory", "invalid_meminfo"),
        format!("meminfo is missing {field}"),
    )
    .with_metadata("field", field)
}
