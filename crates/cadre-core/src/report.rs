//! Error sink and debug switch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::{debug, error};

use crate::error::{CadreError, CadreResult};

/// The single logging surface for fatal-but-reportable conditions.
///
/// The runtime does not prescribe where output goes. Implementations must
/// return quickly: the sink is called synchronously from inside lifecycle
/// operations and publish calls.
pub trait ErrorSink: Send + Sync {
    /// Record a message with optional structured context.
    fn log(&self, message: &str, context: Option<&Value>);
}

/// Default sink: forwards every message to `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn log(&self, message: &str, context: Option<&Value>) {
        match context {
            Some(ctx) => error!(context = %ctx, "{message}"),
            None => error!("{message}"),
        }
    }
}

/// Routes taxonomy errors through an [`ErrorSink`] and decides, based on the
/// debug switch, whether they are returned to the caller or absorbed.
pub struct Reporter {
    sink: Arc<dyn ErrorSink>,
    debug: AtomicBool,
}

impl Reporter {
    /// Create a reporter over the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn ErrorSink>, debug: bool) -> Self {
        Self {
            sink,
            debug: AtomicBool::new(debug),
        }
    }

    /// Create a reporter backed by [`TracingSink`].
    #[must_use]
    pub fn tracing(debug: bool) -> Self {
        Self::new(Arc::new(TracingSink), debug)
    }

    /// Whether taxonomy errors are returned to callers.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Flip the debug switch.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
        debug!(enabled, "Debug switch changed");
    }

    /// Write a free-form message to the sink.
    pub fn log(&self, message: &str, context: Option<&Value>) {
        self.sink.log(message, context);
    }

    /// Report an error through the sink without deciding its fate.
    pub fn report(&self, err: &CadreError) {
        let context = err.context();
        self.sink.log(&err.to_string(), Some(&context));
    }

    /// Report an error, then return it if the debug switch is on.
    ///
    /// # Errors
    ///
    /// Returns `err` unchanged when debugging is enabled.
    pub fn escalate(&self, err: CadreError) -> CadreResult<()> {
        self.report(&err);
        if self.is_debug() { Err(err) } else { Ok(()) }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::tracing(false)
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("debug", &self.is_debug())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        lines: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl ErrorSink for CapturingSink {
        fn log(&self, message: &str, context: Option<&Value>) {
            self.lines
                .lock()
                .unwrap()
                .push((message.to_string(), context.cloned()));
        }
    }

    #[test]
    fn test_escalate_absorbs_when_debug_off() {
        let sink = Arc::new(CapturingSink::default());
        let reporter = Reporter::new(Arc::clone(&sink) as Arc<dyn ErrorSink>, false);

        let result = reporter.escalate(CadreError::undefined_module("probe"));
        assert!(result.is_ok());

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "undefined module: probe");
        assert_eq!(lines[0].1.as_ref().unwrap()["module"], "probe");
    }

    #[test]
    fn test_escalate_raises_when_debug_on() {
        let sink = Arc::new(CapturingSink::default());
        let reporter = Reporter::new(Arc::clone(&sink) as Arc<dyn ErrorSink>, true);

        let result = reporter.escalate(CadreError::undefined_module("probe"));
        assert_eq!(result, Err(CadreError::undefined_module("probe")));
        // Logged before being raised.
        assert_eq!(sink.lines.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_set_debug_toggles() {
        let reporter = Reporter::default();
        assert!(!reporter.is_debug());
        reporter.set_debug(true);
        assert!(reporter.is_debug());
    }

    #[test]
    fn test_log_passes_through() {
        let sink = Arc::new(CapturingSink::default());
        let reporter = Reporter::new(Arc::clone(&sink) as Arc<dyn ErrorSink>, false);
        reporter.log("plain message", None);

        let lines = sink.lines.lock().unwrap();
        assert_eq!(lines[0].0, "plain message");
        assert!(lines[0].1.is_none());
    }
}
