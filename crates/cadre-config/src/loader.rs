//! Config file discovery and layered loading.
//!
//! `Config::load()` runs these steps:
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge `~/.cadre/config.toml` (user)
//! 3. Merge `{workspace}/.cadre/config.toml` (workspace)
//! 4. Apply environment fallbacks to fields no file set
//! 5. Deserialize the merged tree into [`Config`]
//! 6. Validate

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::resolved::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Largest config file accepted (1 MiB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Load the layered configuration.
///
/// `workspace_root` enables the workspace layer. `cadre_home_override`
/// names the directory holding the user `config.toml`, replacing the
/// default `~/.cadre`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is unreadable or malformed, an
/// environment variable is invalid, or the merged result fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    cadre_home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let cadre_home = match cadre_home_override {
        Some(dir) => dir.to_path_buf(),
        None => home_directory()?.join(".cadre"),
    };
    load_with_env(workspace_root, &cadre_home, &collect_env_vars())
}

/// [`load`] against an explicit user directory and environment snapshot.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<S: BuildHasher>(
    workspace_root: Option<&Path>,
    cadre_home: &Path,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged = parse_str(DEFAULTS_TOML, "<embedded defaults>")?;
    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    let mut layers = vec![(ConfigLayer::User, cadre_home.join("config.toml"))];
    if let Some(root) = workspace_root {
        layers.push((
            ConfigLayer::Workspace,
            root.join(".cadre").join("config.toml"),
        ));
    }

    for (layer, path) in layers {
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge_tracking(&mut merged, &overlay, layer, &mut field_sources);
            info!(path = %path.display(), layer = %layer, "loaded config");
            loaded_files.push(path.display().to_string());
        }
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source: e,
        })?;
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a single file with no layering.
///
/// Keys the file omits take their built-in defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed or
/// validated.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = read_bounded(path)?;
    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Read a file, returning `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    match read_bounded(path) {
        Ok(content) => parse_str(&content, &path.display().to_string()).map(Some),
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

fn read_bounded(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }
    Ok(content)
}

fn parse_str(content: &str, origin: &str) -> ConfigResult<toml::Value> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: origin.to_owned(),
        source: e,
    })
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}
