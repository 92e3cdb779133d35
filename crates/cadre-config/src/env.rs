//! Environment variable fallbacks.
//!
//! Environment variables fill in fields that no config file set. A value
//! set by the user or workspace file always wins.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

#[derive(Clone, Copy)]
enum FieldKind {
    Bool,
    Str,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "CADRE_DEBUG",
        field_path: "runtime.debug",
        kind: FieldKind::Bool,
    },
    EnvMapping {
        var_name: "CADRE_DELIVERY",
        field_path: "runtime.delivery",
        kind: FieldKind::Str,
    },
    EnvMapping {
        var_name: "CADRE_LOG",
        field_path: "logging.level",
        kind: FieldKind::Str,
    },
    EnvMapping {
        var_name: "CADRE_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::Str,
    },
];

/// Apply environment fallbacks to fields still holding their default.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a boolean variable holds something
/// other than `true`/`false`/`1`/`0`/`yes`/`no`/`on`/`off`.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = coerce(mapping, raw)?;
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    match mapping.kind {
        FieldKind::Str => Ok(toml::Value::String(raw.trim().to_owned())),
        FieldKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Ok(toml::Value::Boolean(false)),
            other => Err(ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected a boolean, got '{other}'"),
            }),
        },
    }
}

fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_apply_env_fallbacks() {
        let mut merged: toml::Value = toml::from_str("[runtime]\ndebug = false").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("runtime.debug".to_owned(), ConfigLayer::Defaults);
        let env = make_env(&[("CADRE_DEBUG", "yes"), ("CADRE_LOG", "trace")]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 2);
        assert_eq!(merged["runtime"]["debug"].as_bool(), Some(true));
        assert_eq!(merged["logging"]["level"].as_str(), Some("trace"));
        assert_eq!(
            sources.get("runtime.debug"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_fallback_skips_file_values() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);
        let env = make_env(&[("CADRE_LOG", "debug")]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn test_invalid_bool_is_rejected() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("CADRE_DEBUG", "maybe")]);

        let result = apply_env_fallbacks(&mut merged, &mut sources, &env);
        assert!(matches!(
            result,
            Err(ConfigError::EnvError { ref var_name, .. }) if var_name == "CADRE_DEBUG"
        ));
    }
}
