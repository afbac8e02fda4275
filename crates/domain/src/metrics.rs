//! Metric names and per-invocation metric values.

use serde::{Deserialize, Serialize};

/// Handler duration gauge, in milliseconds.
pub const METRIC_DURATION: &str = "aws.lambda.wf.duration";
/// Total memory gauge, in bytes.
pub const METRIC_MEM_TOTAL: &str = "aws.lambda.wf.mem.total";
/// Used memory gauge, in bytes.
pub const METRIC_MEM_USED: &str = "aws.lambda.wf.mem.used";
/// Used memory gauge, in percent.
pub const METRIC_MEM_PERCENTAGE: &str = "aws.lambda.wf.mem.percentage";
/// Cold start delta counter.
pub const METRIC_COLD_STARTS: &str = "aws.lambda.wf.coldstarts";
/// Invocation delta counter.
pub const METRIC_INVOCATIONS: &str = "aws.lambda.wf.invocations";
/// Error delta counter.
pub const METRIC_ERRORS: &str = "aws.lambda.wf.errors";

/// Memory statistics of the execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    /// Total memory in bytes.
    pub total: u64,
    /// Used memory in bytes.
    pub used: u64,
    /// Used memory as a percentage of total.
    pub used_percentage: f64,
}

impl MemoryStats {
    /// Derive used bytes and percentage from total and available bytes.
    ///
    /// ```
    /// use wflambda_domain::MemoryStats;
    ///
    /// let stats = MemoryStats::from_totals(1024, 256);
    /// assert_eq!(stats.used, 768);
    /// assert!((stats.used_percentage - 75.0).abs() < f64::EPSILON);
    /// ```
    #[must_use]
    pub fn from_totals(total: u64, available: u64) -> Self {
        let used = total.saturating_sub(available);
        let used_percentage = if total == 0 {
            0.0
        } else {
            to_f64(used) / to_f64(total) * 100.0
        };
        Self {
            total,
            used,
            used_percentage,
        }
    }
}

/// Gauge values measured for one invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvocationMetrics {
    /// Wall-clock duration of the inner call, in milliseconds.
    pub duration_ms: f64,
    /// Memory figures; absent when the memory source failed.
    pub memory: Option<MemoryStats>,
}

impl InvocationMetrics {
    /// Gauge entries in send order.
    #[must_use]
    pub fn gauges(&self) -> Vec<(&'static str, f64)> {
        let mut gauges = vec![(METRIC_DURATION, self.duration_ms)];
        if let Some(memory) = self.memory {
            gauges.push((METRIC_MEM_TOTAL, to_f64(memory.total)));
            gauges.push((METRIC_MEM_USED, to_f64(memory.used)));
            gauges.push((METRIC_MEM_PERCENTAGE, memory.used_percentage));
        }
        gauges
    }
}

/// Counter increases since the previous report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterDeltas {
    /// Cold starts since the last report.
    pub cold_starts: u64,
    /// Invocations since the last report.
    pub invocations: u64,
}

impl CounterDeltas {
    /// Delta counter entries in send order.
    #[must_use]
    pub const fn entries(&self) -> [(&'static str, u64); 2] {
        [
            (METRIC_COLD_STARTS, self.cold_starts),
            (METRIC_INVOCATIONS, self.invocations),
        ]
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "byte counts stay far below 2^52"
)]
const fn to_f64(value: u64) -> f64 {
    value as f64
}
