//! The runtime that owns every registry.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use cadre_core::{CadreResult, ErrorSink, Reporter};
use cadre_mediator::{DeliveryPolicy, Mediator};
use cadre_toolbox::Toolbox;

use crate::config_bridge;
use crate::registry::ModuleRegistry;
use crate::sandbox::SandboxFactory;

/// Runtime construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Return taxonomy errors to callers instead of only logging them.
    pub debug: bool,
    /// Handler failure policy of the mediator.
    pub delivery: DeliveryPolicy,
}

impl RuntimeConfig {
    /// Debug switch on, isolated delivery.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            debug: true,
            ..Self::default()
        }
    }

    /// Set the delivery policy.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }
}

/// One explicitly constructed unit holding the error reporter, mediator,
/// toolbox, sandbox factory and module registry.
///
/// Independent runtimes share no state.
pub struct Runtime {
    reporter: Arc<Reporter>,
    mediator: Arc<Mediator>,
    toolbox: Arc<Toolbox>,
    sandboxes: Arc<SandboxFactory>,
    registry: ModuleRegistry,
}

impl Runtime {
    /// Build a runtime reporting through `tracing`.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_reporter(config, Arc::new(Reporter::tracing(config.debug)))
    }

    /// Build a runtime reporting through a custom sink.
    #[must_use]
    pub fn with_sink(config: RuntimeConfig, sink: Arc<dyn ErrorSink>) -> Self {
        Self::with_reporter(config, Arc::new(Reporter::new(sink, config.debug)))
    }

    /// Build a runtime from loaded configuration.
    #[must_use]
    pub fn from_config(config: &cadre_config::Config) -> Self {
        Self::new(config_bridge::to_runtime_config(config))
    }

    fn with_reporter(config: RuntimeConfig, reporter: Arc<Reporter>) -> Self {
        let mediator = Arc::new(Mediator::new(Arc::clone(&reporter), config.delivery));
        let toolbox = Arc::new(Toolbox::new(Arc::clone(&reporter)));
        let sandboxes = Arc::new(SandboxFactory::new(
            Arc::clone(&mediator),
            Arc::clone(&reporter),
        ));
        let registry = ModuleRegistry::new(
            Arc::clone(&toolbox),
            Arc::clone(&sandboxes),
            Arc::clone(&mediator),
            Arc::clone(&reporter),
        );

        info!(debug = config.debug, delivery = ?config.delivery, "Runtime created");
        Self {
            reporter,
            mediator,
            toolbox,
            sandboxes,
            registry,
        }
    }

    /// Flip the debug switch.
    pub fn set_debug(&self, debug: bool) {
        self.reporter.set_debug(debug);
    }

    /// Whether the debug switch is on.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.reporter.is_debug()
    }

    /// The error reporter.
    #[must_use]
    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    /// The mediator.
    #[must_use]
    pub fn mediator(&self) -> &Arc<Mediator> {
        &self.mediator
    }

    /// The toolbox.
    #[must_use]
    pub fn toolbox(&self) -> &Arc<Toolbox> {
        &self.toolbox
    }

    /// The sandbox factory, for registering capabilities and profiles.
    #[must_use]
    pub fn sandboxes(&self) -> &Arc<SandboxFactory> {
        &self.sandboxes
    }

    /// The module registry.
    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Start the default instance of every defined module.
    ///
    /// # Errors
    ///
    /// See [`ModuleRegistry::start_all`].
    pub fn start_all(&self, data: &Value) -> CadreResult<usize> {
        self.registry.start_all(data)
    }

    /// Stop and destroy every tracked instance.
    ///
    /// Returns the number of instances torn down.
    ///
    /// # Errors
    ///
    /// See [`ModuleRegistry::stop_all`].
    pub fn shutdown(&self) -> CadreResult<usize> {
        let destroyed = self.registry.stop_all(true)?;
        info!(
            destroyed,
            subscriptions = self.mediator.total_subscriptions(),
            "Runtime shut down"
        );
        Ok(destroyed)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("debug", &self.is_debug())
            .field("mediator", &self.mediator)
            .field("toolbox", &self.toolbox)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::HookModule;
    use serde_json::json;

    #[test]
    fn test_runtimes_are_independent() {
        let a = Runtime::default();
        let b = Runtime::default();

        a.registry()
            .define("only-in-a", Vec::<String>::new(), |_| HookModule::new().boxed());
        assert!(a.registry().is_defined("only-in-a"));
        assert!(!b.registry().is_defined("only-in-a"));
    }

    #[test]
    fn test_set_debug_is_shared_by_components() {
        let runtime = Runtime::default();
        assert!(!runtime.is_debug());
        assert!(runtime.registry().start("ghost", None, &Value::Null).is_ok());

        runtime.set_debug(true);
        assert!(runtime.registry().start("ghost", None, &Value::Null).is_err());
    }

    #[test]
    fn test_config_selects_delivery_policy() {
        let runtime = Runtime::new(RuntimeConfig::debug().with_delivery(DeliveryPolicy::FailFast));
        assert!(runtime.is_debug());
        assert_eq!(runtime.mediator().policy(), DeliveryPolicy::FailFast);
    }

    #[test]
    fn test_shutdown_destroys_everything() {
        let runtime = Runtime::default();
        runtime.registry().define("listener", Vec::<String>::new(), |_| {
            HookModule::new()
                .with_start(|sandbox, _| {
                    sandbox.subscribe("tick", |_| Ok(())).unwrap();
                })
                .boxed()
        });
        runtime.registry().start("listener", Some("l1"), &json!({})).unwrap();
        runtime.registry().start("listener", Some("l2"), &json!({})).unwrap();
        assert_eq!(runtime.mediator().subscriber_count("tick"), 2);

        assert_eq!(runtime.shutdown().unwrap(), 2);
        assert_eq!(runtime.mediator().total_subscriptions(), 0);
        assert!(runtime.registry().modules().is_empty());
    }
}
