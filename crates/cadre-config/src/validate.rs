//! Configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const VALID_DELIVERY: [&str; 2] = ["isolated", "fail-fast"];
const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first bad field.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_runtime(config)?;
    validate_logging(config)?;
    Ok(())
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> ConfigResult<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        field: field.to_owned(),
        message: format!(
            "unsupported value '{value}'; expected one of: {}",
            allowed.join(", ")
        ),
    })
}

fn validate_runtime(config: &Config) -> ConfigResult<()> {
    one_of("runtime.delivery", &config.runtime.delivery, &VALID_DELIVERY)
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    one_of("logging.level", &config.logging.level, &VALID_LEVELS)?;
    one_of("logging.format", &config.logging.format, &VALID_FORMATS)?;

    if let Some(bad) = config
        .logging
        .directives
        .iter()
        .find(|d| d.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "logging.directives".to_owned(),
            message: format!("directive must not be blank: '{bad}'"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_unknown_delivery_rejected() {
        let mut config = Config::default();
        config.runtime.delivery = "best-effort".to_owned();

        let err = validate(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "runtime.delivery")
        );
    }

    #[test]
    fn test_unknown_level_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_fail_fast_and_json_accepted() {
        let mut config = Config::default();
        config.runtime.delivery = "fail-fast".to_owned();
        config.logging.format = "json".to_owned();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_blank_directive_rejected() {
        let mut config = Config::default();
        config.logging.directives = vec!["cadre_runtime=debug".to_owned(), "  ".to_owned()];
        assert!(validate(&config).is_err());
    }
}
