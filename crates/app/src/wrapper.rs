//! Telemetry decorator around the payload adapter.
//!
//! Every invocation resolves a fresh tag set, times the inner call, reports
//! gauges and delta counters, and always flushes and closes the sender before
//! the result (or a captured panic) reaches the caller.

use crate::counters::InvocationCounters;
use crate::payload::{InvocationResult, LambdaHandler};
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use wflambda_domain::{
    InvocationContext, InvocationMetrics, METRIC_ERRORS, MemoryStats, PointTags,
    resolve_point_tags,
};
use wflambda_ports::{LogFields, LoggerPort, MemoryStatsPort, MetricSenderPort};
use wflambda_shared::ErrorEnvelope;

/// Collaborators of the telemetry decorator.
#[derive(Clone)]
pub struct WrapperDeps {
    /// Metric transport.
    pub sender: Arc<dyn MetricSenderPort>,
    /// Memory statistics source.
    pub memory: Arc<dyn MemoryStatsPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Static settings of the telemetry decorator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperSettings {
    /// Base tags merged into every invocation's tag set.
    pub point_tags: PointTags,
}

/// How the inner call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Returned without an error.
    Succeeded,
    /// Returned an error.
    Errored,
    /// Panicked.
    Aborted,
}

impl InvocationOutcome {
    /// Whether the error counter should move.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        !matches!(self, Self::Succeeded)
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Errored => "errored",
            Self::Aborted => "aborted",
        }
    }
}

/// Telemetry-collecting wrapper around a [`LambdaHandler`].
#[derive(Clone)]
pub struct HandlerWrapper {
    inner: LambdaHandler,
    deps: WrapperDeps,
    settings: Arc<WrapperSettings>,
    counters: Arc<InvocationCounters>,
}

impl HandlerWrapper {
    /// Wrap `inner` with telemetry.
    pub fn new(
        inner: LambdaHandler,
        deps: WrapperDeps,
        settings: WrapperSettings,
        counters: Arc<InvocationCounters>,
    ) -> Self {
        Self {
            inner,
            deps,
            settings: Arc::new(settings),
            counters,
        }
    }

    /// Counters shared with other wrappers of the same agent.
    #[must_use]
    pub const fn counters(&self) -> &Arc<InvocationCounters> {
        &self.counters
    }

    /// Invoke the inner callable and report its metrics.
    ///
    /// Returns the inner result unchanged. A panic in the inner call is
    /// re-raised after the sender has been flushed and closed.
    pub async fn invoke(&self, context: InvocationContext, payload: Value) -> InvocationResult {
        let resolved = resolve_point_tags(&self.settings.point_tags, &context);
        if let Some(error) = resolved.arn_error {
            self.log_failure(
                "wflambda.tags.invalidArn",
                &ErrorEnvelope::from(error),
                None,
            );
        }
        let tags = resolved.tags;
        let source: Box<str> = context.function_name().into();
        let request_id: Box<str> = context.request_id().into();

        if let Some(logger) = self.deps.logger.as_ref() {
            logger.debug(
                "wflambda.invoke.start",
                "Invocation started",
                Some(log_fields_request(&request_id)),
            );
        }

        let guard = FlushGuard::new(Arc::clone(&self.deps.sender), self.deps.logger.clone());
        let started_at = Instant::now();
        self.counters.invocations.increment(1);

        let inner = Arc::clone(&self.inner);
        let caught = AssertUnwindSafe(async move { inner.as_ref()(context, payload).await })
            .catch_unwind()
            .await;

        let outcome = match &caught {
            Ok(Ok(_)) => InvocationOutcome::Succeeded,
            Ok(Err(_)) => InvocationOutcome::Errored,
            Err(_) => InvocationOutcome::Aborted,
        };
        if outcome.is_failure() {
            self.counters.errors.increment(1);
        }
        if self.counters.take_cold_start() {
            self.counters.cold_starts.increment(1);
        }

        let metrics = InvocationMetrics {
            duration_ms: started_at.elapsed().as_secs_f64() * 1000.0,
            memory: self.read_memory(),
        };
        self.emit(&metrics, &source, &tags);

        if outcome.is_failure() {
            let delta = self.counters.errors.take_delta();
            if delta > 0 {
                self.send_delta(METRIC_ERRORS, delta, &source, &tags);
            }
        }
        guard.finish();

        if let Some(logger) = self.deps.logger.as_ref() {
            logger.debug(
                "wflambda.invoke.completed",
                "Invocation completed",
                Some(log_fields_completed(&request_id, &metrics, outcome)),
            );
        }

        match caught {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    fn read_memory(&self) -> Option<MemoryStats> {
        match self.deps.memory.memory_stats() {
            Ok(stats) => Some(stats),
            Err(error) => {
                self.log_failure("wflambda.memory.unavailable", &error, None);
                None
            },
        }
    }

    fn emit(&self, metrics: &InvocationMetrics, source: &str, tags: &PointTags) {
        let timestamp_secs = report_timestamp_secs();
        for (name, value) in metrics.gauges() {
            if let Err(error) = self
                .deps
                .sender
                .send_metric(name, value, timestamp_secs, source, tags)
            {
                self.log_send_failure(name, &error);
            }
        }
        for (name, delta) in self.counters.take_deltas().entries() {
            self.send_delta(name, delta, source, tags);
        }
    }

    fn send_delta(&self, name: &str, delta: u64, source: &str, tags: &PointTags) {
        if let Err(error) = self
            .deps
            .sender
            .send_delta_counter(name, delta, source, tags)
        {
            self.log_send_failure(name, &error);
        }
    }

    fn log_send_failure(&self, name: &str, error: &ErrorEnvelope) {
        self.log_failure(
            "wflambda.metrics.sendFailed",
            error,
            Some(log_fields_metric(name)),
        );
    }

    fn log_failure(&self, event: &str, error: &ErrorEnvelope, fields: Option<LogFields>) {
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.failure(event, error, fields);
        }
    }
}

/// Flushes and closes the sender exactly once, even if the invocation future
/// is dropped before completion.
struct FlushGuard {
    sender: Arc<dyn MetricSenderPort>,
    logger: Option<Arc<dyn LoggerPort>>,
    armed: bool,
}

impl FlushGuard {
    const fn new(sender: Arc<dyn MetricSenderPort>, logger: Option<Arc<dyn LoggerPort>>) -> Self {
        Self {
            sender,
            logger,
            armed: true,
        }
    }

    fn finish(mut self) {
        self.armed = false;
        self.flush_and_close();
    }

    fn flush_and_close(&self) {
        if let Err(error) = self.sender.flush() {
            self.log_failure("wflambda.sender.flushFailed", &error);
        }
        if let Err(error) = self.sender.close() {
            self.log_failure("wflambda.sender.closeFailed", &error);
        }
    }

    fn log_failure(&self, event: &str, error: &ErrorEnvelope) {
        if let Some(logger) = self.logger.as_ref() {
            logger.failure(event, error, None);
        }
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Some(logger) = self.logger.as_ref() {
                logger.warn(
                    "wflambda.invoke.cancelled",
                    "Invocation dropped before completion",
                    None,
                );
            }
            self.flush_and_close();
        }
    }
}

fn report_timestamp_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}

fn log_fields_request(request_id: &str) -> LogFields {
    let mut fields = BTreeMap::new();
    fields.insert(
        "requestId".to_owned().into_boxed_str(),
        Value::String(request_id.to_owned()),
    );
    fields
}

fn log_fields_completed(
    request_id: &str,
    metrics: &InvocationMetrics,
    outcome: InvocationOutcome,
) -> LogFields {
    let mut fields = log_fields_request(request_id);
    fields.insert(
        "durationMs".to_owned().into_boxed_str(),
        Value::from(metrics.duration_ms),
    );
    fields.insert(
        "outcome".to_owned().into_boxed_str(),
        Value::String(outcome.as_str().to_owned()),
    );
    fields
}

fn log_fields_metric(name: &str) -> LogFields {
    let mut fields = BTreeMap::new();
    fields.insert(
        "metric".to_owned().into_boxed_str(),
        Value::String(name.to_owned()),
    );
    fields
}
