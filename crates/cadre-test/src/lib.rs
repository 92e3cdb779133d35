//! Cadre Test - Shared test utilities for the Cadre runtime.
//!
//! This crate provides recording mocks and runtime fixtures that can be
//! used across multiple Cadre crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! cadre-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust
//! use cadre_test::{Journal, RecordingModule, debug_runtime};
//! use serde_json::json;
//!
//! let (runtime, sink) = debug_runtime();
//! let journal = Journal::new();
//! let j = journal.clone();
//! runtime
//!     .registry()
//!     .define("probe", Vec::<String>::new(), move |_| RecordingModule::new("probe", &j).boxed());
//!
//! runtime.registry().start("probe", None, &json!({})).unwrap();
//! assert_eq!(journal.entries(), vec!["probe:start"]);
//! assert!(sink.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
