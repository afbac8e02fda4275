//! In-memory port implementations for tests.
//!
//! These implementations are intended for:
//! - Unit/integration tests of the telemetry decorator
//! - Asserting the exact order of sender calls (sends, flush, close)
//! - Local experimentation without a metric transport

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use wflambda_ports::{
    LogEvent, LogFields, LoggerPort, MemoryStats, MemoryStatsPort, MetricSenderPort, PointTags,
};
use wflambda_shared::{ErrorEnvelope, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event in memory.
///
/// Children share the same event buffer and merge their base fields into
/// each event.
#[derive(Debug, Clone, Default)]
pub struct CaptureLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base: LogFields,
}

impl CaptureLogger {
    /// Create an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured events in emission order.
    pub fn events(&self) -> Vec<LogEvent> {
        lock(&self.events).clone()
    }

    /// Captured event names in emission order.
    pub fn event_names(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .map(|event| event.event.to_string())
            .collect()
    }
}

impl LoggerPort for CaptureLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base.is_empty() {
            let mut fields = self.base.clone();
            fields.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(fields);
        }
        lock(&self.events).push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base = self.base.clone();
        base.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base,
        })
    }
}

/// A single call observed by [`RecordingSender`].
#[derive(Debug, Clone, PartialEq)]
pub enum SenderCall {
    /// `send_metric`.
    Metric {
        /// Metric name.
        name: String,
        /// Gauge value.
        value: f64,
        /// Report timestamp in seconds.
        timestamp_secs: i64,
        /// Metric source.
        source: String,
        /// Point tags.
        tags: PointTags,
    },
    /// `send_delta_counter`.
    DeltaCounter {
        /// Counter name.
        name: String,
        /// Delta value.
        delta: u64,
        /// Metric source.
        source: String,
        /// Point tags.
        tags: PointTags,
    },
    /// `flush`.
    Flush,
    /// `close`.
    Close,
}

impl SenderCall {
    /// Metric or counter name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Metric { name, .. } | Self::DeltaCounter { name, .. } => Some(name),
            Self::Flush | Self::Close => None,
        }
    }
}

/// Metric sender that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSender {
    calls: Mutex<Vec<SenderCall>>,
    fail_sends: AtomicBool,
    fail_flush: AtomicBool,
}

impl RecordingSender {
    /// Create a sender whose calls all succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sender whose sends and flush fail (calls are still recorded).
    #[must_use]
    pub fn failing() -> Self {
        let sender = Self::default();
        sender.fail_sends.store(true, Ordering::SeqCst);
        sender.fail_flush.store(true, Ordering::SeqCst);
        sender
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<SenderCall> {
        lock(&self.calls).clone()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        lock(&self.calls).clear();
    }

    /// Gauge names in send order.
    pub fn metric_names(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                SenderCall::Metric { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Sum of all deltas sent for `name`, or `None` if never sent.
    pub fn delta(&self, name: &str) -> Option<u64> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                SenderCall::DeltaCounter {
                    name: sent, delta, ..
                } if sent == name => Some(*delta),
                _ => None,
            })
            .reduce(|total, delta| total + delta)
    }

    /// Value of the last gauge sent for `name`.
    pub fn gauge(&self, name: &str) -> Option<f64> {
        lock(&self.calls).iter().rev().find_map(|call| match call {
            SenderCall::Metric {
                name: sent, value, ..
            } if sent == name => Some(*value),
            _ => None,
        })
    }

    /// Tags of the first recorded metric or counter.
    pub fn first_tags(&self) -> Option<PointTags> {
        lock(&self.calls).iter().find_map(|call| match call {
            SenderCall::Metric { tags, .. } | SenderCall::DeltaCounter { tags, .. } => {
                Some(tags.clone())
            },
            _ => None,
        })
    }

    fn record(&self, call: SenderCall, fail: &AtomicBool) -> Result<()> {
        let label = call.name().unwrap_or("flush").to_owned();
        lock(&self.calls).push(call);
        if fail.load(Ordering::SeqCst) {
            return Err(ErrorEnvelope::transport(format!("recording sender rejected {label}")));
        }
        Ok(())
    }
}

impl MetricSenderPort for RecordingSender {
    fn send_metric(
        &self,
        name: &str,
        value: f64,
        timestamp_secs: i64,
        source: &str,
        tags: &PointTags,
    ) -> Result<()> {
        self.record(
            SenderCall::Metric {
                name: name.to_owned(),
                value,
                timestamp_secs,
                source: source.to_owned(),
                tags: tags.clone(),
            },
            &self.fail_sends,
        )
    }

    fn send_delta_counter(
        &self,
        name: &str,
        delta: u64,
        source: &str,
        tags: &PointTags,
    ) -> Result<()> {
        self.record(
            SenderCall::DeltaCounter {
                name: name.to_owned(),
                delta,
                source: source.to_owned(),
                tags: tags.clone(),
            },
            &self.fail_sends,
        )
    }

    fn flush(&self) -> Result<()> {
        self.record(SenderCall::Flush, &self.fail_flush)
    }

    fn close(&self) -> Result<()> {
        lock(&self.calls).push(SenderCall::Close);
        Ok(())
    }
}

/// Memory source returning fixed statistics.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryStats(pub MemoryStats);

impl FixedMemoryStats {
    /// Fixed statistics derived from total and available bytes.
    #[must_use]
    pub fn from_totals(total: u64, available: u64) -> Self {
        Self(MemoryStats::from_totals(total, available))
    }
}

impl MemoryStatsPort for FixedMemoryStats {
    fn memory_stats(&self) -> Result<MemoryStats> {
        Ok(self.0)
    }
}

/// Memory source that always fails.
#[derive(Debug, Default)]
pub struct FailingMemoryStats;

impl MemoryStatsPort for FailingMemoryStats {
    fn memory_stats(&self) -> Result<MemoryStats> {
        Err(ErrorEnvelope::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "memory statistics unavailable",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wflambda_ports::LogLevel;

    #[test]
    fn recording_sender_keeps_call_order() {
        let sender = RecordingSender::new();
        let tags = PointTags::new();
        sender.send_metric("gauge", 1.5, 10, "fn", &tags).unwrap();
        sender.send_delta_counter("counter", 2, "fn", &tags).unwrap();
        sender.send_delta_counter("counter", 3, "fn", &tags).unwrap();
        sender.flush().unwrap();
        sender.close().unwrap();

        let calls = sender.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[3], SenderCall::Flush);
        assert_eq!(calls[4], SenderCall::Close);
        assert_eq!(sender.delta("counter"), Some(5));
        assert_eq!(sender.gauge("gauge"), Some(1.5));
        assert_eq!(sender.metric_names(), vec!["gauge".to_string()]);
    }

    #[test]
    fn failing_sender_still_records() {
        let sender = RecordingSender::failing();
        assert!(sender.send_delta_counter("c", 1, "fn", &PointTags::new()).is_err());
        assert!(sender.flush().is_err());
        assert!(sender.close().is_ok());
        assert_eq!(sender.calls().len(), 3);
    }

    #[test]
    fn capture_logger_children_share_events() {
        let logger = CaptureLogger::new();
        let mut fields = LogFields::new();
        fields.insert("requestId".into(), serde_json::Value::from("req-1"));
        let child = logger.child(fields);
        child.info("wflambda.test", "hello", None);

        let events = logger.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, LogLevel::Info);
        assert_eq!(
            events[0].fields.as_ref().and_then(|fields| fields.get("requestId")),
            Some(&serde_json::Value::from("req-1"))
        );
    }

    #[test]
    fn memory_doubles() {
        assert_eq!(FixedMemoryStats::from_totals(100, 40).memory_stats().unwrap().used, 60);
        assert!(FailingMemoryStats.memory_stats().is_err());
        NoopLogger.info("ignored", "ignored", None);
    }
}
