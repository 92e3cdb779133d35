//! Prelude module - commonly used test helpers.
//!
//! Use `use cadre_test::prelude::*;` to import all essential helpers.

pub use crate::fixtures::{debug_runtime, init_test_logging, quiet_runtime};
pub use crate::mocks::{Journal, RecordingModule, RecordingSink, SinkEntry};
