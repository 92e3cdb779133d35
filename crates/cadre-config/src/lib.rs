//! Layered configuration for the Cadre module runtime.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cadre_config::Config;
//!
//! let resolved = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("delivery policy: {}", resolved.config.runtime.delivery);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest:
//!
//! 1. **Workspace** (`{workspace}/.cadre/config.toml`)
//! 2. **User** (`~/.cadre/config.toml`)
//! 3. **Environment variables** (`CADRE_*`), fallback only
//! 4. **Embedded defaults** (`defaults.toml`)
//!
//! This crate depends on no other Cadre crate. Conversion into runtime
//! types lives in `cadre_runtime::config_bridge`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// File discovery and layered loading.
pub mod loader;
/// Deep merge with per-field source tracking.
pub mod merge;
mod resolved;
/// Configuration struct definitions.
pub mod types;
/// Validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use merge::ConfigLayer;
pub use resolved::ResolvedConfig;
pub use types::{Config, LoggingSection, RuntimeSection};

impl Config {
    /// Load with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is malformed or the merged
    /// configuration fails validation.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Load with an explicit user config directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any file is malformed or the merged
    /// configuration fails validation.
    pub fn load_with_home(
        workspace_root: Option<&std::path::Path>,
        cadre_home: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(cadre_home))
    }

    /// Load a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
