use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[runtime]` section.
    pub runtime: RuntimeSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[runtime]`: lifecycle and delivery behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// Return taxonomy errors to callers instead of only logging them.
    pub debug: bool,
    /// Handler failure policy: `"isolated"` or `"fail-fast"`.
    pub delivery: String,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            debug: false,
            delivery: "isolated".to_owned(),
        }
    }
}

/// `[logging]`: subscriber setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level.
    pub level: String,
    /// Output format.
    pub format: String,
    /// Per-target directives.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
