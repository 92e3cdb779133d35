//! Module definitions, instances and their lifecycle.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use cadre_core::{CadreError, CadreResult, OwnerId, Reporter, panic_message};
use cadre_mediator::Mediator;
use cadre_toolbox::Toolbox;

use crate::dependency::{Dependencies, Dependency};
use crate::module::{Creator, Module, ModuleDefinition};
use crate::sandbox::{Sandbox, SandboxFactory};

/// Lifecycle state of a tracked instance.
///
/// Destroyed instances are no longer tracked, so there is no state for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    /// Created but never started.
    Instantiated,
    /// Running.
    Started,
    /// Stopped, restartable without re-instantiation.
    Stopped,
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Instantiated => "instantiated",
            Self::Started => "started",
            Self::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// Shared access to one tracked instance.
#[derive(Clone)]
pub struct InstanceHandle {
    module: String,
    instance_id: String,
    sandbox: Sandbox,
    object: Arc<Mutex<Box<dyn Module>>>,
}

impl InstanceHandle {
    /// Module name.
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Instance id.
    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Identity the instance's subscriptions are attributed to.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        self.sandbox.owner()
    }

    /// The instance's sandbox.
    #[must_use]
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Run `f` with exclusive access to the instance object.
    ///
    /// Must not be called from inside one of the same instance's hooks.
    pub fn with_module<R>(&self, f: impl FnOnce(&mut dyn Module) -> R) -> R {
        let mut guard = self.object.lock().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_mut())
    }

    /// Whether two handles refer to the same instance object.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("module", &self.module)
            .field("instance_id", &self.instance_id)
            .field("owner", &self.owner())
            .finish_non_exhaustive()
    }
}

/// Snapshot of a tracked instance.
#[derive(Debug, Clone)]
pub struct InstanceRecord {
    /// Shared handle to the instance.
    pub handle: InstanceHandle,
    /// State at the time of the snapshot.
    pub state: InstanceState,
}

/// Introspection view of one definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    /// Declared dependency names.
    pub dependencies: Vec<String>,
    /// Capability profile, if any.
    pub sandbox_profile: Option<String>,
    /// Tracked instances and their states, keyed by instance id.
    pub instances: BTreeMap<String, InstanceState>,
}

#[derive(Default)]
struct RegistryState {
    definitions: HashMap<String, Arc<ModuleDefinition>>,
    instances: HashMap<String, BTreeMap<String, InstanceRecord>>,
}

impl RegistryState {
    fn record_mut(&mut self, name: &str, id: &str) -> Option<&mut InstanceRecord> {
        self.instances.get_mut(name)?.get_mut(id)
    }
}

/// Tracks module definitions and drives instances through
/// `Instantiated → Started ⇄ Stopped → destroyed`.
///
/// No internal lock is held while creators or hooks run, so user code may
/// call back into the registry.
pub struct ModuleRegistry {
    state: RwLock<RegistryState>,
    toolbox: Arc<Toolbox>,
    sandboxes: Arc<SandboxFactory>,
    mediator: Arc<Mediator>,
    reporter: Arc<Reporter>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(
        toolbox: Arc<Toolbox>,
        sandboxes: Arc<SandboxFactory>,
        mediator: Arc<Mediator>,
        reporter: Arc<Reporter>,
    ) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            toolbox,
            sandboxes,
            mediator,
            reporter,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Report an undefined module; `Err` only when the debug switch is on.
    fn undefined(&self, name: &str) -> CadreResult<()> {
        self.reporter.escalate(CadreError::undefined_module(name))
    }

    fn definition(&self, name: &str) -> Option<Arc<ModuleDefinition>> {
        self.read().definitions.get(name).cloned()
    }

    /// Define a module from a name, dependency names and a creator.
    ///
    /// Returns `false`, after reporting, if the name is empty or taken.
    pub fn define<I, S, F>(&self, name: impl Into<String>, dependencies: I, creator: F) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Dependencies) -> Box<dyn Module> + Send + Sync + 'static,
    {
        let creator: Creator = Arc::new(creator);
        self.define_module(ModuleDefinition::from_creator(name, creator).with_dependencies(dependencies))
    }

    /// Define a module from a prepared definition.
    ///
    /// Returns `false`, after reporting, if the name is empty or taken. The
    /// existing definition is untouched.
    pub fn define_module(&self, definition: ModuleDefinition) -> bool {
        let name = definition.name().to_owned();
        if name.is_empty() {
            self.reporter
                .report(&CadreError::invalid_argument("module name must not be empty"));
            return false;
        }

        let mut state = self.write();
        if state.definitions.contains_key(&name) {
            drop(state);
            self.reporter.report(&CadreError::invalid_argument(format!(
                "module '{name}' is already defined"
            )));
            return false;
        }
        debug!(
            module = %name,
            dependencies = ?definition.dependencies(),
            profile = ?definition.sandbox_profile(),
            "Defined module"
        );
        state.definitions.insert(name, Arc::new(definition));
        true
    }

    /// Whether a definition named `name` exists.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> bool {
        self.read().definitions.contains_key(name)
    }

    /// Create and track a fresh instance of `name`.
    ///
    /// `instance_id` defaults to the module name. Each declared dependency is
    /// resolved through the toolbox, falling back to
    /// [`Dependency::Unresolved`]. An instance already tracked under the
    /// same id is replaced and its subscriptions are revoked; its hooks are
    /// not called.
    ///
    /// # Errors
    ///
    /// [`CadreError::UndefinedModule`] if `name` is not defined and the debug
    /// switch is on, or [`CadreError::ModuleFailure`] if the creator panics.
    /// Both are reported first; with debug off the call returns `Ok(None)`.
    pub fn instantiate(
        &self,
        name: &str,
        instance_id: Option<&str>,
    ) -> CadreResult<Option<InstanceHandle>> {
        let Some(definition) = self.definition(name) else {
            self.undefined(name)?;
            return Ok(None);
        };
        let id = instance_id.unwrap_or(name);

        let resolved = definition
            .dependencies()
            .iter()
            .map(|dep| match self.toolbox.request(dep, Some(name)) {
                Some(tool) => Dependency::Tool {
                    name: dep.clone(),
                    tool,
                },
                None => Dependency::Unresolved(dep.clone()),
            })
            .collect();
        let dependencies = Dependencies::new(resolved);
        let object = match guarded(name, id, "create", || definition.create(&dependencies)) {
            Ok(object) => object,
            Err(err) => {
                self.reporter.escalate(err)?;
                return Ok(None);
            },
        };
        let sandbox = self
            .sandboxes
            .create(name, id, definition.sandbox_profile());

        let handle = InstanceHandle {
            module: name.to_owned(),
            instance_id: id.to_owned(),
            sandbox,
            object: Arc::new(Mutex::new(object)),
        };
        let record = InstanceRecord {
            handle: handle.clone(),
            state: InstanceState::Instantiated,
        };

        let replaced = self
            .write()
            .instances
            .entry(name.to_owned())
            .or_default()
            .insert(id.to_owned(), record);

        if let Some(old) = replaced {
            if old.state == InstanceState::Started {
                warn!(
                    module = name,
                    instance = id,
                    "Replacing a started instance without stopping it"
                );
            }
            self.mediator.unsubscribe_all(old.handle.owner());
        }

        info!(
            module = name,
            instance = id,
            resolved = dependencies.iter().filter(|d| d.is_resolved()).count(),
            unresolved = dependencies.iter().filter(|d| !d.is_resolved()).count(),
            "Instantiated module"
        );
        Ok(Some(handle))
    }

    /// Start an instance, instantiating it first if it is not tracked.
    ///
    /// Returns `Ok(true)` if the start hook ran and `Ok(false)` if the
    /// instance was already started.
    ///
    /// # Errors
    ///
    /// [`CadreError::UndefinedModule`] if `name` is not defined and the debug
    /// switch is on. A panicking creator or start hook is reported as
    /// [`CadreError::ModuleFailure`]: the instance keeps its previous state
    /// and loses any subscriptions the hook made. With debug off the call
    /// returns `Ok(false)`.
    pub fn start(&self, name: &str, instance_id: Option<&str>, data: &Value) -> CadreResult<bool> {
        if !self.is_defined(name) {
            self.undefined(name)?;
            return Ok(false);
        }
        let id = instance_id.unwrap_or(name);

        if self.instance(name, Some(id)).is_none() && self.instantiate(name, Some(id))?.is_none() {
            return Ok(false);
        }

        let (handle, previous) = {
            let mut state = self.write();
            let Some(record) = state.record_mut(name, id) else {
                return Ok(false);
            };
            if record.state == InstanceState::Started {
                trace!(module = name, instance = id, "Start ignored: already started");
                return Ok(false);
            }
            let previous = record.state;
            record.state = InstanceState::Started;
            (record.handle.clone(), previous)
        };

        let started = guarded(name, id, "start", || {
            handle.with_module(|module| module.on_start(handle.sandbox(), data));
        });
        if let Err(err) = started {
            self.mediator.unsubscribe_all(handle.owner());
            self.restore(&handle, previous);
            self.reporter.escalate(err)?;
            return Ok(false);
        }
        info!(module = name, instance = id, "Started module");
        Ok(true)
    }

    /// Stop an instance, optionally destroying it.
    ///
    /// A started instance runs `on_stop`, loses every subscription made
    /// through its sandbox, and becomes `Stopped`. With `destroy`, the
    /// instance then runs `on_destroy` and is forgotten; once a module has no
    /// instances left its definition is removed and the name may be defined
    /// again.
    ///
    /// Returns `Ok(true)` if anything changed.
    ///
    /// # Errors
    ///
    /// [`CadreError::UndefinedModule`] if `name` is not defined and the debug
    /// switch is on. With debug off the call returns `Ok(false)`. A panicking
    /// stop or destroy hook does not interrupt the teardown; it is reported
    /// as [`CadreError::ModuleFailure`] and returned only with debug on.
    pub fn stop(&self, name: &str, instance_id: Option<&str>, destroy: bool) -> CadreResult<bool> {
        if !self.is_defined(name) {
            self.undefined(name)?;
            return Ok(false);
        }
        let id = instance_id.unwrap_or(name);

        let (handle, was_started) = {
            let mut state = self.write();
            let Some(record) = state.record_mut(name, id) else {
                debug!(module = name, instance = id, "Stop ignored: not instantiated");
                return Ok(false);
            };
            let was_started = record.state == InstanceState::Started;
            if was_started {
                record.state = InstanceState::Stopped;
            }
            (record.handle.clone(), was_started)
        };

        let mut failure = None;
        if was_started {
            failure = guarded(name, id, "stop", || {
                handle.with_module(|module| module.on_stop(handle.sandbox()));
            })
            .err();
            let revoked = self.mediator.unsubscribe_all(handle.owner());
            info!(module = name, instance = id, revoked, "Stopped module");
        } else if !destroy {
            trace!(module = name, instance = id, "Stop ignored: not started");
            return Ok(false);
        }

        if destroy {
            let destroyed = guarded(name, id, "destroy", || {
                handle.with_module(|module| module.on_destroy(handle.sandbox()));
            });
            if let Err(err) = destroyed {
                match failure {
                    Some(_) => self.reporter.report(&err),
                    None => failure = Some(err),
                }
            }
            self.mediator.unsubscribe_all(handle.owner());
            self.forget(&handle);
        }

        if let Some(err) = failure {
            self.reporter.escalate(err)?;
        }
        Ok(true)
    }

    /// Put a started instance back into `previous` after its start hook
    /// failed, unless a replacement took the slot meanwhile.
    fn restore(&self, handle: &InstanceHandle, previous: InstanceState) {
        let mut state = self.write();
        if let Some(record) = state.record_mut(handle.module_name(), handle.instance_id()) {
            if record.handle.same_instance(handle) && record.state == InstanceState::Started {
                record.state = previous;
            }
        }
    }

    /// Drop the record for `handle` and, if it was the module's last
    /// instance, the definition too.
    fn forget(&self, handle: &InstanceHandle) {
        let name = handle.module_name();
        let id = handle.instance_id();
        let mut state = self.write();

        let Some(instances) = state.instances.get_mut(name) else {
            return;
        };
        // A replacement may have taken the slot while hooks ran.
        if instances
            .get(id)
            .is_some_and(|record| record.handle.same_instance(handle))
        {
            instances.remove(id);
        }
        if instances.is_empty() {
            state.instances.remove(name);
            state.definitions.remove(name);
            info!(module = name, instance = id, "Destroyed module and its definition");
        } else {
            info!(module = name, instance = id, "Destroyed module instance");
        }
    }

    /// Snapshot of one tracked instance.
    ///
    /// `None` means "not instantiated", including for undefined modules.
    #[must_use]
    pub fn instance(&self, name: &str, instance_id: Option<&str>) -> Option<InstanceRecord> {
        let id = instance_id.unwrap_or(name);
        self.read().instances.get(name)?.get(id).cloned()
    }

    /// Snapshots of every tracked instance of `name`, ordered by id.
    #[must_use]
    pub fn instances(&self, name: &str) -> Vec<InstanceRecord> {
        self.read()
            .instances
            .get(name)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every definition with its tracked instances, ordered by name.
    #[must_use]
    pub fn modules(&self) -> BTreeMap<String, ModuleInfo> {
        let state = self.read();
        state
            .definitions
            .iter()
            .map(|(name, definition)| {
                let instances = state
                    .instances
                    .get(name)
                    .map(|by_id| {
                        by_id
                            .iter()
                            .map(|(id, record)| (id.clone(), record.state))
                            .collect()
                    })
                    .unwrap_or_default();
                let info = ModuleInfo {
                    dependencies: definition.dependencies().to_vec(),
                    sandbox_profile: definition.sandbox_profile().map(str::to_owned),
                    instances,
                };
                (name.clone(), info)
            })
            .collect()
    }

    /// Start the default instance of every defined module, in name order.
    ///
    /// Returns the number of instances whose start hook ran.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`start`](Self::start).
    pub fn start_all(&self, data: &Value) -> CadreResult<usize> {
        let mut names: Vec<String> = self.read().definitions.keys().cloned().collect();
        names.sort();

        let mut started: usize = 0;
        for name in names {
            if self.start(&name, None, data)? {
                started = started.saturating_add(1);
            }
        }
        Ok(started)
    }

    /// Stop every tracked instance, optionally destroying them.
    ///
    /// Returns the number of instances that changed.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`stop`](Self::stop).
    pub fn stop_all(&self, destroy: bool) -> CadreResult<usize> {
        let mut targets: Vec<(String, String)> = self
            .read()
            .instances
            .iter()
            .flat_map(|(name, by_id)| by_id.keys().map(move |id| (name.clone(), id.clone())))
            .collect();
        targets.sort();

        let mut changed: usize = 0;
        for (name, id) in targets {
            // An earlier destroy hook may have torn this one down already.
            if self.instance(&name, Some(&id)).is_none() {
                continue;
            }
            if self.stop(&name, Some(&id), destroy)? {
                changed = changed.saturating_add(1);
            }
        }
        Ok(changed)
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().definitions.len()
    }

    /// Whether nothing is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().definitions.is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules())
            .finish_non_exhaustive()
    }
}

/// Run module code, turning a panic into [`CadreError::ModuleFailure`].
fn guarded<R>(
    module: &str,
    instance: &str,
    stage: &'static str,
    f: impl FnOnce() -> R,
) -> CadreResult<R> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let err = CadreError::ModuleFailure {
            module: module.to_owned(),
            instance: instance.to_owned(),
            stage,
            message: panic_message(payload.as_ref()),
        };
        warn!(module, instance, stage, error = %err, "Module code panicked");
        err
    })
}
