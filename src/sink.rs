//! ErrorSink trait for recoverable per-event failures.
//!
//! Exporters report missing geometry records and missing hit collections here
//! and carry on with the next event. Messages are human-readable and start
//! with `"### Error:"`.

/// Destination for recoverable error reports.
pub trait ErrorSink {
    fn report(&mut self, message: &str);

    /// Number of reports received so far.
    fn count(&self) -> usize;
}

/// Sink forwarding every report to `tracing` at error level.
#[derive(Debug, Default)]
pub struct LogSink {
    count: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorSink for LogSink {
    fn report(&mut self, message: &str) {
        self.count += 1;
        tracing::error!("{}", message);
    }

    fn count(&self) -> usize {
        self.count
    }
}

/// Sink that keeps every message. Useful for tests.
#[derive(Debug, Default)]
pub struct InMemorySink {
    messages: Vec<String>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

impl ErrorSink for InMemorySink {
    fn report(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }

    fn count(&self) -> usize {
        self.messages.len()
    }
}
