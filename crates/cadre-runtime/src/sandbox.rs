//! Per-instance sandboxes and the factory that wires them.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, trace};

use cadre_core::{CadreError, CadreResult, OwnerId, Reporter};
use cadre_mediator::{Delivery, HandlerResult, Mediator, SubscriptionHandle, TopicEvent, TopicMap};

/// An auxiliary service handed to modules through their sandbox.
pub type Capability = Arc<dyn Any + Send + Sync>;

/// A module instance's only channel to the mediator.
///
/// Every subscription made through a sandbox is attributed to its owner, so
/// the registry can revoke all of them when the instance stops.
#[derive(Clone)]
pub struct Sandbox {
    owner: OwnerId,
    module: String,
    instance: String,
    mediator: Arc<Mediator>,
    capabilities: Arc<BTreeMap<String, Capability>>,
}

impl Sandbox {
    /// Identity that subscriptions made here are attributed to.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Name of the module this sandbox belongs to.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Instance id this sandbox belongs to.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance
    }

    /// Subscribe on behalf of this instance.
    ///
    /// # Errors
    ///
    /// Returns [`CadreError::InvalidArgument`] if `topic` is empty.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> CadreResult<SubscriptionHandle>
    where
        F: Fn(&mut TopicEvent) -> HandlerResult + Send + Sync + 'static,
    {
        self.mediator.subscribe_owned(self.owner, topic, handler)
    }

    /// Subscribe a whole topic map, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`CadreError::InvalidArgument`] if any topic is empty, in which
    /// case nothing is subscribed.
    pub fn subscribe_topics(&self, topics: TopicMap) -> CadreResult<Vec<SubscriptionHandle>> {
        self.mediator.subscribe_map(Some(self.owner), topics)
    }

    /// Remove one of this sandbox's subscriptions.
    ///
    /// Handles owned by anything else are left alone and yield `false`.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        if handle.owner() != Some(self.owner) {
            debug!(
                module = %self.module,
                subscription = %handle.id(),
                "Refusing to remove a subscription owned elsewhere"
            );
            return false;
        }
        self.mediator.unsubscribe(handle)
    }

    /// Remove every subscription made through this sandbox.
    pub fn unsubscribe_all(&self) -> usize {
        self.mediator.unsubscribe_all(self.owner)
    }

    /// Publish through the shared mediator.
    ///
    /// # Errors
    ///
    /// Propagates handler failures under fail-fast delivery.
    pub fn publish(&self, topic: &str, data: Value) -> CadreResult<Delivery> {
        self.mediator.publish(topic, data)
    }

    /// Number of live subscriptions made through this sandbox.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.mediator.owned_count(self.owner)
    }

    /// An exposed capability.
    #[must_use]
    pub fn capability(&self, name: &str) -> Option<Capability> {
        self.capabilities.get(name).cloned()
    }

    /// An exposed capability downcast to `T`.
    #[must_use]
    pub fn capability_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.capability(name)?.downcast::<T>().ok()
    }

    /// Names of the exposed capabilities, sorted.
    #[must_use]
    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sandbox")
            .field("owner", &self.owner)
            .field("module", &self.module)
            .field("instance", &self.instance)
            .field("capabilities", &self.capability_names())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct FactoryState {
    capabilities: HashMap<String, Capability>,
    profiles: HashMap<String, Vec<String>>,
}

/// Produces sandboxes and holds the capabilities they may expose.
///
/// A profile is a named whitelist of capability names. Sandboxes created
/// for a profile expose only the capabilities it lists; sandboxes created
/// without one expose every registered capability.
pub struct SandboxFactory {
    mediator: Arc<Mediator>,
    reporter: Arc<Reporter>,
    state: RwLock<FactoryState>,
}

impl SandboxFactory {
    /// Create a factory binding sandboxes to `mediator`.
    #[must_use]
    pub fn new(mediator: Arc<Mediator>, reporter: Arc<Reporter>) -> Self {
        Self {
            mediator,
            reporter,
            state: RwLock::new(FactoryState::default()),
        }
    }

    fn reject(&self, message: String) -> bool {
        self.reporter.report(&CadreError::invalid_argument(message));
        false
    }

    /// Register a capability under `name`.
    ///
    /// Returns `false`, after reporting, for an empty or taken name.
    /// Sandboxes already created keep the set they were built with.
    pub fn register_capability(&self, name: impl Into<String>, capability: Capability) -> bool {
        let name = name.into();
        if name.is_empty() {
            return self.reject("capability name must not be empty".to_owned());
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.capabilities.contains_key(&name) {
            drop(state);
            return self.reject(format!("capability '{name}' is already registered"));
        }
        state.capabilities.insert(name.clone(), capability);
        drop(state);

        debug!(capability = %name, "Registered sandbox capability");
        true
    }

    /// Register a named whitelist of capability names.
    ///
    /// Names not registered as capabilities when a sandbox is created are
    /// skipped. Returns `false`, after reporting, for an empty or taken name.
    pub fn register_profile<I, S>(&self, name: impl Into<String>, capabilities: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.is_empty() {
            return self.reject("profile name must not be empty".to_owned());
        }
        let allowed: Vec<String> = capabilities.into_iter().map(Into::into).collect();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.profiles.contains_key(&name) {
            drop(state);
            return self.reject(format!("sandbox profile '{name}' is already registered"));
        }
        debug!(profile = %name, capabilities = ?allowed, "Registered sandbox profile");
        state.profiles.insert(name, allowed);
        true
    }

    /// Whether a profile named `name` exists.
    #[must_use]
    pub fn has_profile(&self, name: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .profiles
            .contains_key(name)
    }

    /// Build a sandbox for one module instance with a fresh owner identity.
    ///
    /// An unknown profile is reported and yields a sandbox with no
    /// capabilities.
    #[must_use]
    pub fn create(&self, module: &str, instance: &str, profile: Option<&str>) -> Sandbox {
        let resolved: Option<BTreeMap<String, Capability>> = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            let pick = |name: &String| {
                state
                    .capabilities
                    .get(name)
                    .map(|cap| (name.clone(), Arc::clone(cap)))
            };
            match profile {
                None => Some(state.capabilities.keys().filter_map(pick).collect()),
                Some(profile) => state
                    .profiles
                    .get(profile)
                    .map(|allowed| allowed.iter().filter_map(pick).collect()),
            }
        };

        let capabilities = resolved.unwrap_or_else(|| {
            self.reject(format!(
                "module '{module}' names unknown sandbox profile '{}'",
                profile.unwrap_or_default()
            ));
            BTreeMap::new()
        });
        self.bind(module, instance, capabilities)
    }

    fn bind(
        &self,
        module: &str,
        instance: &str,
        capabilities: BTreeMap<String, Capability>,
    ) -> Sandbox {
        let sandbox = Sandbox {
            owner: OwnerId::new(),
            module: module.to_owned(),
            instance: instance.to_owned(),
            mediator: Arc::clone(&self.mediator),
            capabilities: Arc::new(capabilities),
        };
        trace!(module, instance, owner = %sandbox.owner, "Created sandbox");
        sandbox
    }
}

impl fmt::Debug for SandboxFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut capabilities: Vec<&String> = state.capabilities.keys().collect();
        capabilities.sort();
        let mut profiles: Vec<&String> = state.profiles.keys().collect();
        profiles.sort();
        f.debug_struct("SandboxFactory")
            .field("capabilities", &capabilities)
            .field("profiles", &profiles)
            .finish_non_exhaustive()
    }
}
