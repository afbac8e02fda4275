//! JSON-line metric sender.
//!
//! Samples are buffered in memory and written as one JSON object per line on
//! `flush`. `close` flushes and leaves the sender usable for the next
//! invocation, since one sender instance serves the whole process.

use crate::log_sink::LineSink;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use wflambda_ports::{MetricSenderPort, PointTags};
use wflambda_shared::redaction::redact_if_secret;
use wflambda_shared::{ErrorCode, ErrorEnvelope, Result};

/// Default number of buffered lines before sends are rejected.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum MetricLine<'a> {
    Gauge {
        metric: &'a str,
        value: f64,
        timestamp: i64,
        source: &'a str,
        tags: BTreeMap<&'a str, String>,
    },
    DeltaCounter {
        metric: &'a str,
        value: u64,
        source: &'a str,
        tags: BTreeMap<&'a str, String>,
    },
}

/// Metric sender writing JSON lines to a [`LineSink`].
pub struct JsonLineSender {
    sink: Arc<dyn LineSink>,
    buffer: Mutex<Vec<String>>,
    capacity: usize,
}

impl JsonLineSender {
    /// Create a sender with [`DEFAULT_BUFFER_CAPACITY`].
    #[must_use]
    pub fn new(sink: Arc<dyn LineSink>) -> Self {
        Self::with_capacity(sink, DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a sender that buffers at most `capacity` lines between flushes.
    #[must_use]
    pub fn with_capacity(sink: Arc<dyn LineSink>, capacity: usize) -> Self {
        Self {
            sink,
            buffer: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of lines waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(&self, line: &MetricLine<'_>) -> Result<()> {
        let mut encoded = serde_json::to_string(line).map_err(|error| {
            ErrorEnvelope::invariant(
                ErrorCode::new("sender", "encode_failed"),
                format!("metric line serialization failed: {error}"),
            )
        })?;
        encoded.push('\n');

        let mut buffer = self.lock();
        if buffer.len() >= self.capacity {
            return Err(ErrorEnvelope::transport("metric buffer is full")
                .with_metadata("capacity", self.capacity.to_string()));
        }
        buffer.push(encoded);
        Ok(())
    }
}

impl MetricSenderPort for JsonLineSender {
    fn send_metric(
        &self,
        name: &str,
        value: f64,
        timestamp_secs: i64,
        source: &str,
        tags: &PointTags,
    ) -> Result<()> {
        self.enqueue(&MetricLine::Gauge {
            metric: name,
            value,
            timestamp: timestamp_secs,
            source,
            tags: redact_tags(tags),
        })
    }

    fn send_delta_counter(
        &self,
        name: &str,
        delta: u64,
        source: &str,
        tags: &PointTags,
    ) -> Result<()> {
        self.enqueue(&MetricLine::DeltaCounter {
            metric: name,
            value: delta,
            source,
            tags: redact_tags(tags),
        })
    }

    fn flush(&self) -> Result<()> {
        let lines = std::mem::take(&mut *self.lock());
        let mut first_error = None;
        for line in &lines {
            if let Err(error) = self.sink.write_line(line) {
                first_error.get_or_insert(error);
            }
        }
        if let Err(error) = self.sink.flush() {
            first_error.get_or_insert(error);
        }
        first_error.map_or(Ok(()), |error| {
            Err(error.with_metadata("lines", lines.len().to_string()))
        })
    }

    fn close(&self) -> Result<()> {
        self.flush()
    }
}

fn redact_tags(tags: &PointTags) -> BTreeMap<&str, String> {
    tags.iter()
        .map(|(key, value)| (key.as_ref(), redact_if_secret(key, value)))
        .collect()
}
