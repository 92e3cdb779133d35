//! The module contract and module definitions.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dependency::Dependencies;
use crate::sandbox::Sandbox;

/// A module instance driven by the registry.
///
/// Every hook defaults to a no-op, so the lifecycle is total: any module can
/// be started, stopped and destroyed regardless of which hooks it overrides.
///
/// Hooks run while the instance is exclusively borrowed. A hook may drive
/// other modules through the registry, but must not stop or destroy its own
/// instance.
pub trait Module: Send {
    /// Called on `Instantiated`/`Stopped` → `Started` with the start payload.
    fn on_start(&mut self, sandbox: &Sandbox, data: &Value) {
        let _ = (sandbox, data);
    }

    /// Called on `Started` → `Stopped`, before the instance's subscriptions
    /// are revoked.
    fn on_stop(&mut self, sandbox: &Sandbox) {
        let _ = sandbox;
    }

    /// Called once, right before the instance is discarded.
    fn on_destroy(&mut self, sandbox: &Sandbox) {
        let _ = sandbox;
    }
}

type StartHook = Box<dyn FnMut(&Sandbox, &Value) + Send>;
type SandboxHook = Box<dyn FnMut(&Sandbox) + Send>;

/// A [`Module`] assembled from closures.
#[derive(Default)]
pub struct HookModule {
    start: Option<StartHook>,
    stop: Option<SandboxHook>,
    destroy: Option<SandboxHook>,
}

impl HookModule {
    /// A module with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start hook.
    #[must_use]
    pub fn with_start(mut self, hook: impl FnMut(&Sandbox, &Value) + Send + 'static) -> Self {
        self.start = Some(Box::new(hook));
        self
    }

    /// Set the stop hook.
    #[must_use]
    pub fn with_stop(mut self, hook: impl FnMut(&Sandbox) + Send + 'static) -> Self {
        self.stop = Some(Box::new(hook));
        self
    }

    /// Set the destroy hook.
    #[must_use]
    pub fn with_destroy(mut self, hook: impl FnMut(&Sandbox) + Send + 'static) -> Self {
        self.destroy = Some(Box::new(hook));
        self
    }

    /// Box into a trait object.
    #[must_use]
    pub fn boxed(self) -> Box<dyn Module> {
        Box::new(self)
    }
}

impl Module for HookModule {
    fn on_start(&mut self, sandbox: &Sandbox, data: &Value) {
        if let Some(hook) = self.start.as_mut() {
            hook(sandbox, data);
        }
    }

    fn on_stop(&mut self, sandbox: &Sandbox) {
        if let Some(hook) = self.stop.as_mut() {
            hook(sandbox);
        }
    }

    fn on_destroy(&mut self, sandbox: &Sandbox) {
        if let Some(hook) = self.destroy.as_mut() {
            hook(sandbox);
        }
    }
}

impl fmt::Debug for HookModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookModule")
            .field("start", &self.start.is_some())
            .field("stop", &self.stop.is_some())
            .field("destroy", &self.destroy.is_some())
            .finish()
    }
}

/// Builds a fresh instance from resolved dependencies.
pub type Creator = Arc<dyn Fn(&Dependencies) -> Box<dyn Module> + Send + Sync>;

/// A named recipe for module instances.
#[derive(Clone)]
pub struct ModuleDefinition {
    name: String,
    dependencies: Vec<String>,
    creator: Creator,
    sandbox_profile: Option<String>,
}

impl ModuleDefinition {
    /// Create a definition with no dependencies.
    pub fn new<F>(name: impl Into<String>, creator: F) -> Self
    where
        F: Fn(&Dependencies) -> Box<dyn Module> + Send + Sync + 'static,
    {
        Self::from_creator(name, Arc::new(creator))
    }

    /// Create a definition from an already-shared creator.
    #[must_use]
    pub fn from_creator(name: impl Into<String>, creator: Creator) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            creator,
            sandbox_profile: None,
        }
    }

    /// Declare dependency names, resolved in this order at instantiation.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict sandboxes of this module to a named capability profile.
    #[must_use]
    pub fn with_sandbox_profile(mut self, profile: impl Into<String>) -> Self {
        self.sandbox_profile = Some(profile.into());
        self
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared dependency names.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Capability profile, if any.
    #[must_use]
    pub fn sandbox_profile(&self) -> Option<&str> {
        self.sandbox_profile.as_deref()
    }

    pub(crate) fn create(&self, dependencies: &Dependencies) -> Box<dyn Module> {
        (self.creator)(dependencies)
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("sandbox_profile", &self.sandbox_profile)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_builder() {
        let def = ModuleDefinition::new("logger", |_| HookModule::new().boxed())
            .with_dependencies(["storage", "clock"])
            .with_sandbox_profile("basic");

        assert_eq!(def.name(), "logger");
        assert_eq!(def.dependencies(), ["storage", "clock"]);
        assert_eq!(def.sandbox_profile(), Some("basic"));
        assert!(format!("{def:?}").contains("logger"));
    }

    #[test]
    fn test_hook_module_debug_reports_hooks() {
        let module = HookModule::new().with_stop(|_| {});
        let rendered = format!("{module:?}");
        assert!(rendered.contains("start: false"));
        assert!(rendered.contains("stop: true"));
    }
}
