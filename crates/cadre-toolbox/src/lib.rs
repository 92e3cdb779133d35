//! Cadre Toolbox - named, lazily constructed shared tools.
//!
//! A tool is registered once under a name together with a factory. The
//! first [`Toolbox::request`] for that name calls the factory; every later
//! request returns the same cached instance.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cadre_core::Reporter;
//! use cadre_toolbox::Toolbox;
//!
//! struct Storage {
//!     prefix: String,
//! }
//!
//! let toolbox = Toolbox::new(Arc::new(Reporter::default()));
//! assert!(toolbox.register_tool("storage", |_id| Storage { prefix: "app".into() }));
//!
//! let first = toolbox.request_as::<Storage>("storage", None).unwrap();
//! let again = toolbox.request_as::<Storage>("storage", Some("other")).unwrap();
//! assert!(Arc::ptr_eq(&first, &again));
//! assert_eq!(first.prefix, "app");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod toolbox;

pub use toolbox::{Tool, ToolFactory, Toolbox};
