//! `tracing`-backed logger adapter.

use serde_json::Value;
use wflambda_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use wflambda_shared::redaction::{REDACTED, is_secret_key};

/// Logger that forwards events to the active `tracing` subscriber.
///
/// Structured fields and the error payload are redacted and rendered as JSON
/// strings under `fields` and `error`.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    base_fields: LogFields,
    min_level: LogLevel,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    /// Create a logger with no base fields and a `Debug` floor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_fields: LogFields::new(),
            min_level: LogLevel::Debug,
        }
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Set the minimum log level; the subscriber filter still applies.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn render(&self, event: LogEvent) -> Option<Rendered> {
        if event.level < self.min_level {
            return None;
        }
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields.unwrap_or_default());
        redact_fields(&mut fields);

        let error = event.error.map(|mut error| {
            redact_value(&mut error);
            error.to_string()
        });
        let fields = if fields.is_empty() {
            None
        } else {
            Some(fields_to_json(&fields).to_string())
        };
        Some(Rendered {
            level: event.level,
            event: event.event,
            message: event.message,
            fields,
            error,
        })
    }
}

#[derive(Debug)]
struct Rendered {
    level: LogLevel,
    event: Box<str>,
    message: Box<str>,
    fields: Option<String>,
    error: Option<String>,
}

macro_rules! emit {
    ($level:expr, $rendered:expr) => {
        tracing::event!(
            target: "wflambda",
            $level,
            event = %$rendered.event,
            fields = $rendered.fields.as_deref(),
            error = $rendered.error.as_deref(),
            "{}",
            $rendered.message
        )
    };
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let Some(rendered) = self.render(event) else {
            return;
        };
        match rendered.level {
            LogLevel::Debug => emit!(tracing::Level::DEBUG, rendered),
            LogLevel::Info => emit!(tracing::Level::INFO, rendered),
            LogLevel::Warn => emit!(tracing::Level::WARN, rendered),
            LogLevel::Error => emit!(tracing::Level::ERROR, rendered),
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            base_fields: merged,
            min_level: self.min_level,
        })
    }
}

fn fields_to_json(fields: &LogFields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
    )
}

fn redact_fields(fields: &mut LogFields) {
    for (key, value) in fields.iter_mut() {
        if is_secret_key(key) {
            *value = Value::String(REDACTED.to_owned());
        } else {
            redact_value(value);
        }
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_secret_key(key) {
                    *nested = Value::String(REDACTED.to_owned());
                } else {
                    redact_value(nested);
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                redact_value(item);
            }
        },
        _ => {},
    }
}
