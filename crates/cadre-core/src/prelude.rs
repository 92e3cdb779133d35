//! Prelude module - commonly used types for convenient import.
//!
//! Use `use cadre_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CadreError, CadreResult};

// Reporting
pub use crate::{ErrorSink, Reporter, TracingSink};

// Identity
pub use crate::OwnerId;
