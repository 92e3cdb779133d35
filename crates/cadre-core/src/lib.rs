//! Cadre Core - shared primitives for the Cadre module runtime.
//!
//! This crate provides:
//! - [`CadreError`]: the error taxonomy every runtime component reports through
//! - [`ErrorSink`] / [`TracingSink`]: the single logging surface for reportable errors
//! - [`Reporter`]: an error sink combined with the process-wide debug switch
//! - [`OwnerId`]: the identity subscriptions are attributed to
//!
//! # Debug switch
//!
//! With debugging enabled, programming mistakes (referencing an undefined
//! module) surface immediately as `Err` values. With debugging disabled they
//! are only logged, and the failing operation degrades to a no-op.
//!
//! ```rust
//! use cadre_core::{CadreError, Reporter};
//!
//! let reporter = Reporter::tracing(false);
//! let outcome = reporter.escalate(CadreError::undefined_module("ghost"));
//! assert!(outcome.is_ok());
//!
//! reporter.set_debug(true);
//! let outcome = reporter.escalate(CadreError::undefined_module("ghost"));
//! assert!(outcome.is_err());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod owner;
mod report;

pub use error::{CadreError, CadreResult, panic_message};
pub use owner::OwnerId;
pub use report::{ErrorSink, Reporter, TracingSink};
