//! Mock implementations for testing.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use cadre_core::ErrorSink;
use cadre_runtime::{Module, Sandbox};

/// One message captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SinkEntry {
    /// The logged message.
    pub message: String,
    /// Structured context, if any.
    pub context: Option<Value>,
}

/// An [`ErrorSink`] that keeps every message for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    entries: Arc<Mutex<Vec<SinkEntry>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything logged so far.
    #[must_use]
    pub fn entries(&self) -> Vec<SinkEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Logged messages only.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.message).collect()
    }

    /// Number of logged messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(needle))
    }

    /// Forget everything logged so far.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ErrorSink for RecordingSink {
    fn log(&self, message: &str, context: Option<&Value>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SinkEntry {
                message: message.to_string(),
                context: context.cloned(),
            });
    }
}

/// A shared, ordered log of events written by test modules and handlers.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn record(&self, line: impl Into<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    /// Every line, in write order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of lines equal to `line`.
    #[must_use]
    pub fn count(&self, line: &str) -> usize {
        self.entries().iter().filter(|l| l.as_str() == line).count()
    }

    /// Forget every line.
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// A [`Module`] that writes `<label>:start`, `<label>:stop` and
/// `<label>:destroy` to a [`Journal`].
///
/// Topics passed to [`RecordingModule::listening_to`] are subscribed on
/// every start; each delivery writes `<label>:<topic>=<data>`.
#[derive(Debug)]
pub struct RecordingModule {
    label: String,
    journal: Journal,
    topics: Vec<String>,
}

impl RecordingModule {
    /// Create a module writing to `journal`.
    #[must_use]
    pub fn new(label: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
            topics: Vec::new(),
        }
    }

    /// Subscribe to `topic` on every start.
    #[must_use]
    pub fn listening_to(mut self, topic: impl Into<String>) -> Self {
        self.topics.push(topic.into());
        self
    }

    /// Box into a trait object.
    #[must_use]
    pub fn boxed(self) -> Box<dyn Module> {
        Box::new(self)
    }
}

impl Module for RecordingModule {
    fn on_start(&mut self, sandbox: &Sandbox, _data: &Value) {
        self.journal.record(format!("{}:start", self.label));
        for topic in &self.topics {
            let journal = self.journal.clone();
            let prefix = format!("{}:{topic}", self.label);
            if let Err(e) = sandbox.subscribe(topic.as_str(), move |event| {
                journal.record(format!("{prefix}={}", event.data));
                Ok(())
            }) {
                self.journal.record(format!("{}:error={e}", self.label));
            }
        }
    }

    fn on_stop(&mut self, _sandbox: &Sandbox) {
        self.journal.record(format!("{}:stop", self.label));
    }

    fn on_destroy(&mut self, _sandbox: &Sandbox) {
        self.journal.record(format!("{}:destroy", self.label));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recording_sink_captures_context() {
        let sink = RecordingSink::new();
        sink.log("first", None);
        sink.log("second", Some(&json!({"topic": "log"})));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.messages(), vec!["first", "second"]);
        assert_eq!(sink.entries()[1].context, Some(json!({"topic": "log"})));
        assert!(sink.contains("sec"));

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_journal_is_shared_between_clones() {
        let journal = Journal::new();
        let other = journal.clone();
        other.record("a");
        journal.record("a");
        journal.record("b");

        assert_eq!(journal.entries(), vec!["a", "a", "b"]);
        assert_eq!(other.count("a"), 2);
    }
}
