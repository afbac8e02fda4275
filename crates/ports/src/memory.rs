//! Memory statistics boundary contract.

use wflambda_domain::MemoryStats;
use wflambda_shared::Result;

/// Source of memory statistics for the execution environment.
pub trait MemoryStatsPort: Send + Sync {
    /// Read current memory statistics.
    fn memory_stats(&self) -> Result<MemoryStats>;
}
