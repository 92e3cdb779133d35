//! Runtime fixtures.

use std::sync::{Arc, Once};

use cadre_runtime::{Runtime, RuntimeConfig};
use tracing_subscriber::EnvFilter;

use crate::mocks::RecordingSink;

/// A debug-mode runtime reporting into a fresh [`RecordingSink`].
///
/// Taxonomy errors are returned to the caller and also land in the sink.
#[must_use]
pub fn debug_runtime() -> (Runtime, RecordingSink) {
    runtime_with(RuntimeConfig::debug())
}

/// A non-debug runtime reporting into a fresh [`RecordingSink`].
///
/// Taxonomy errors are only logged, so operations degrade to no-ops.
#[must_use]
pub fn quiet_runtime() -> (Runtime, RecordingSink) {
    runtime_with(RuntimeConfig::default())
}

/// A runtime with the given config reporting into a fresh [`RecordingSink`].
#[must_use]
pub fn runtime_with(config: RuntimeConfig) -> (Runtime, RecordingSink) {
    let sink = RecordingSink::new();
    let runtime = Runtime::with_sink(config, Arc::new(sink.clone()));
    (runtime, sink)
}

/// Install a test-writer subscriber once per process.
///
/// Honors `RUST_LOG`, defaulting to `warn`.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_fixtures_differ_in_debug_switch() {
        let (debug, debug_sink) = debug_runtime();
        let (quiet, quiet_sink) = quiet_runtime();
        assert!(debug.is_debug());
        assert!(!quiet.is_debug());

        assert!(debug.registry().start("ghost", None, &Value::Null).is_err());
        assert!(quiet.registry().start("ghost", None, &Value::Null).is_ok());
        assert_eq!(debug_sink.len(), 1);
        assert_eq!(quiet_sink.len(), 1);
    }
}
