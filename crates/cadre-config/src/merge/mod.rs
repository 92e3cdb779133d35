//! Deep merge of TOML value trees.
//!
//! Merging raw [`toml::Value`] trees rather than deserialized structs keeps
//! "absent" distinct from "default": a key missing from an overlay never
//! overrides the layer below it.

mod deep;
mod types;

pub use deep::{deep_merge, deep_merge_tracking, record_leaves};
pub use types::{ConfigLayer, FieldSources};
