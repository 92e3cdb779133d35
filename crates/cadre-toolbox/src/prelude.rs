//! Prelude module - commonly used types for convenient import.
//!
//! Use `use cadre_toolbox::prelude::*;` to import all essential types.

pub use crate::{Tool, ToolFactory, Toolbox};
