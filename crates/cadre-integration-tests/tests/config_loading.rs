//! Layered configuration driving runtime and logging setup.

use std::collections::HashMap;
use std::fs;

use cadre_config::{Config, ConfigError, ConfigLayer, loader};
use cadre_mediator::DeliveryPolicy;
use cadre_runtime::Runtime;
use cadre_runtime::config_bridge::{to_log_config, to_runtime_config};
use cadre_telemetry::LogFormat;
use tempfile::TempDir;

fn write_config(dir: &std::path::Path, body: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("config.toml"), body).unwrap();
}

#[test]
fn test_workspace_overrides_user_and_feeds_runtime() {
    let home = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_config(
        home.path(),
        "[runtime]\ndebug = true\n\n[logging]\nlevel = \"debug\"\n",
    );
    write_config(
        &workspace.path().join(".cadre"),
        "[runtime]\ndelivery = \"fail-fast\"\n\n[logging]\nformat = \"json\"\n",
    );

    let resolved =
        loader::load_with_env(Some(workspace.path()), home.path(), &HashMap::new()).unwrap();
    assert_eq!(resolved.loaded_files.len(), 2);
    assert_eq!(resolved.source_of("runtime.debug"), Some(ConfigLayer::User));
    assert_eq!(
        resolved.source_of("runtime.delivery"),
        Some(ConfigLayer::Workspace)
    );

    let runtime = Runtime::from_config(&resolved.config);
    assert!(runtime.is_debug());
    assert_eq!(runtime.mediator().policy(), DeliveryPolicy::FailFast);

    let log = to_log_config(&resolved.config);
    assert_eq!(log.level, "debug");
    assert_eq!(log.format, LogFormat::Json);
}

#[test]
fn test_env_fills_only_default_fields() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "[logging]\nlevel = \"warn\"\n");
    let env: HashMap<String, String> = [
        ("CADRE_LOG", "trace"),
        ("CADRE_DEBUG", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();

    let resolved = loader::load_with_env(None, home.path(), &env).unwrap();
    assert_eq!(resolved.config.logging.level, "warn");
    assert!(resolved.config.runtime.debug);
    assert_eq!(
        resolved.source_of("runtime.debug"),
        Some(ConfigLayer::Environment)
    );
}

#[test]
fn test_invalid_delivery_fails_validation() {
    let home = TempDir::new().unwrap();
    write_config(home.path(), "[runtime]\ndelivery = \"sometimes\"\n");

    let result = loader::load_with_env(None, home.path(), &HashMap::new());
    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_missing_files_yield_defaults() {
    let home = TempDir::new().unwrap();
    let resolved = Config::load_with_home(None, home.path());
    // The process environment may carry CADRE_* variables; only check files.
    let resolved = resolved.unwrap();
    assert!(resolved.loaded_files.is_empty());
    assert_eq!(to_runtime_config(&Config::default()).delivery, DeliveryPolicy::Isolated);
}
