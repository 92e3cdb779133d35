//! Cadre Telemetry - logging setup for the Cadre module runtime.
//!
//! Installs a global `tracing` subscriber from a [`LogConfig`]: an
//! `EnvFilter` built from a base level plus per-target directives, and one
//! formatting layer writing to stdout, stderr or a rolling file.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadre_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), cadre_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("cadre_mediator=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("Runtime starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
