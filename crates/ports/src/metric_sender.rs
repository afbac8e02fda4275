//! Metric transport boundary contract.

use wflambda_domain::PointTags;
use wflambda_shared::Result;

/// Boundary contract for the metric transport.
///
/// Implementations own the wire format and any buffering. Every method must
/// remain callable after a previous call failed; `close` is issued once per
/// invocation, after `flush`.
pub trait MetricSenderPort: Send + Sync {
    /// Send a gauge sample stamped with `timestamp_secs` (Unix seconds).
    fn send_metric(
        &self,
        name: &str,
        value: f64,
        timestamp_secs: i64,
        source: &str,
        tags: &PointTags,
    ) -> Result<()>;

    /// Send a delta counter increment.
    fn send_delta_counter(&self, name: &str, delta: u64, source: &str, tags: &PointTags)
    -> Result<()>;

    /// Push any buffered data to the transport.
    fn flush(&self) -> Result<()>;

    /// Release the transport for this invocation.
    fn close(&self) -> Result<()>;
}
