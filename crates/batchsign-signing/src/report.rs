//! Fatal failure reporting

use std::sync::Mutex;

use tracing::error;

/// Receives the single message that marks a run as failed
pub trait FailureSink: Send + Sync {
    /// Mark the run as failed
    fn set_failed(&self, message: &str);
}

/// Logs the failure
#[derive(Debug, Default)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn set_failed(&self, message: &str) {
        error!("{}", message);
    }
}

/// Keeps every reported failure
#[derive(Debug, Default)]
pub struct RecordingFailureSink {
    messages: Mutex<Vec<String>>,
}

impl RecordingFailureSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported so far
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

impl FailureSink for RecordingFailureSink {
    fn set_failed(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink() {
        let sink = RecordingFailureSink::new();
        assert!(sink.messages().is_empty());

        sink.set_failed("first");
        sink.set_failed("second");
        assert_eq!(sink.messages(), vec!["first", "second"]);
    }
}
