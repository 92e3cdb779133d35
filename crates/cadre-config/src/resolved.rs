//! The merged configuration plus its provenance.

use crate::merge::{ConfigLayer, FieldSources};
use crate::types::Config;

/// A loaded configuration together with where each field came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The merged, validated configuration.
    pub config: Config,
    /// Dotted field path → layer that set it.
    pub field_sources: FieldSources,
    /// Files that contributed, in load order.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// Layer that set `field` (e.g. `"runtime.debug"`).
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }

    /// Render the effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&self.config)
    }

    /// Render the effective configuration as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved() -> ResolvedConfig {
        let mut field_sources = FieldSources::new();
        field_sources.insert("runtime.debug".to_owned(), ConfigLayer::Environment);
        ResolvedConfig {
            config: Config::default(),
            field_sources,
            loaded_files: Vec::new(),
        }
    }

    #[test]
    fn test_source_of() {
        let resolved = resolved();
        assert_eq!(
            resolved.source_of("runtime.debug"),
            Some(ConfigLayer::Environment)
        );
        assert_eq!(resolved.source_of("logging.level"), None);
    }

    #[test]
    fn test_rendered_toml_parses_back() {
        let rendered = resolved().to_toml().unwrap();
        assert!(rendered.contains("[runtime]"));
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_to_json_has_sections() {
        let json: serde_json::Value = serde_json::from_str(&resolved().to_json().unwrap()).unwrap();
        assert_eq!(json["runtime"]["delivery"], "isolated");
        assert_eq!(json["logging"]["level"], "info");
    }
}
