//! Line sinks shared by the stdout adapters.

use std::io::Write;
use wflambda_shared::Result;

/// A sink that receives newline-terminated lines.
pub trait LineSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str) -> Result<()>;

    /// Push any buffered bytes downstream.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Line sink that writes to stdout, which the Lambda runtime forwards to
/// CloudWatch Logs.
#[derive(Debug, Default)]
pub struct StdoutLineSink;

impl LineSink for StdoutLineSink {
    fn write_line(&self, line: &str) -> Result<()> {
        std::io::stdout().lock().write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        std::io::stdout().lock().flush()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::LineSink;
    use std::sync::{Mutex, PoisonError};
    use wflambda_shared::{ErrorEnvelope, Result};

    /// In-memory sink for adapter tests.
    #[derive(Debug, Default)]
    pub struct MemorySink {
        lines: Mutex<Vec<String>>,
        flushes: Mutex<usize>,
        reject: bool,
    }

    impl MemorySink {
        pub fn rejecting() -> Self {
            Self {
                reject: true,
                ..Self::default()
            }
        }

        pub fn take(&self) -> Vec<String> {
            let mut guard = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        }

        pub fn flushes(&self) -> usize {
            *self.flushes.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl LineSink for MemorySink {
        fn write_line(&self, line: &str) -> Result<()> {
            if self.reject {
                return Err(ErrorEnvelope::transport("memory sink rejected line"));
            }
            self.lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(line.to_owned());
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            *self.flushes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LineSink;
    use super::memory::MemorySink;

    #[test]
    fn memory_sink_captures_lines() {
        let sink = MemorySink::default();
        sink.write_line("hello\n").unwrap();
        sink.write_line("world\n").unwrap();
        sink.flush().unwrap();

        let lines = sink.take();
        assert_eq!(lines, vec!["hello\n".to_owned(), "world\n".to_owned()]);
        assert_eq!(sink.flushes(), 1);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn rejecting_sink_reports_transport_errors() {
        let sink = MemorySink::rejecting();
        let Err(error) = sink.write_line("dropped\n") else {
            panic!("expected rejection");
        };
        assert!(error.to_string().contains("memory sink rejected line"));
    }
}
