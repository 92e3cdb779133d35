//! Bridge from `cadre_config::Config` to runtime and telemetry types.
//!
//! The config crate depends on no other Cadre crate; conversion into domain
//! types happens here, once.

use tracing::warn;

use cadre_config::Config;
use cadre_mediator::DeliveryPolicy;
use cadre_telemetry::{LogConfig, LogFormat};

use crate::runtime::RuntimeConfig;

/// Convert config to [`RuntimeConfig`].
#[must_use]
pub fn to_runtime_config(cfg: &Config) -> RuntimeConfig {
    RuntimeConfig {
        debug: cfg.runtime.debug,
        delivery: to_delivery_policy(&cfg.runtime.delivery),
    }
}

/// Parse a delivery policy name, falling back to isolated delivery.
#[must_use]
pub fn to_delivery_policy(name: &str) -> DeliveryPolicy {
    match name {
        "isolated" => DeliveryPolicy::Isolated,
        "fail-fast" => DeliveryPolicy::FailFast,
        other => {
            warn!(delivery = other, "Unknown delivery policy, using isolated");
            DeliveryPolicy::Isolated
        },
    }
}

/// Convert config to [`LogConfig`].
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let format = cfg.logging.format.parse().unwrap_or_else(|_| {
        warn!(format = %cfg.logging.format, "Unknown log format, using pretty");
        LogFormat::Pretty
    });

    cfg.logging.directives.iter().fold(
        LogConfig::new(&cfg.logging.level).with_format(format),
        |log, directive| log.with_directive(directive),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_bridges_to_defaults() {
        let cfg = Config::default();
        assert_eq!(to_runtime_config(&cfg), RuntimeConfig::default());

        let log = to_log_config(&cfg);
        assert_eq!(log.level, "info");
        assert_eq!(log.format, LogFormat::Pretty);
        assert!(log.directives.is_empty());
    }

    #[test]
    fn test_runtime_section_maps_through() {
        let mut cfg = Config::default();
        cfg.runtime.debug = true;
        cfg.runtime.delivery = "fail-fast".to_owned();

        let rc = to_runtime_config(&cfg);
        assert!(rc.debug);
        assert_eq!(rc.delivery, DeliveryPolicy::FailFast);
    }

    #[test]
    fn test_unknown_values_fall_back() {
        assert_eq!(to_delivery_policy("whenever"), DeliveryPolicy::Isolated);

        let mut cfg = Config::default();
        cfg.logging.format = "xml".to_owned();
        assert_eq!(to_log_config(&cfg).format, LogFormat::Pretty);
    }

    #[test]
    fn test_logging_section_maps_through() {
        let mut cfg = Config::default();
        cfg.logging.level = "debug".to_owned();
        cfg.logging.format = "json".to_owned();
        cfg.logging.directives = vec!["cadre_mediator=trace".to_owned()];

        let log = to_log_config(&cfg);
        assert_eq!(log.level, "debug");
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["cadre_mediator=trace"]);
    }
}
