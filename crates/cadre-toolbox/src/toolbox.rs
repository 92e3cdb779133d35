//! Named tool factories with a lazily filled, per-name cache.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use cadre_core::{CadreError, Reporter};

/// A shared tool instance. Opaque to the toolbox.
pub type Tool = Arc<dyn Any + Send + Sync>;

/// Builds a tool. Receives the `tool_id` of the request that triggered
/// construction.
pub type ToolFactory = Arc<dyn Fn(Option<&str>) -> Tool + Send + Sync>;

struct Registration {
    factory: ToolFactory,
    instance: Option<Tool>,
}

/// Registry of named tool factories with a per-name instance cache.
///
/// The cache holds one instance per name. Distinct `tool_id` values passed to
/// [`request`](Self::request) share that entry: only the first request's id
/// reaches the factory.
pub struct Toolbox {
    tools: RwLock<HashMap<String, Registration>>,
    reporter: Arc<Reporter>,
}

impl Toolbox {
    /// Create an empty toolbox.
    #[must_use]
    pub fn new(reporter: Arc<Reporter>) -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            reporter,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Registration>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Registration>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a factory under `name`.
    ///
    /// Returns `false`, after reporting through the error sink, if `name` is
    /// empty or already registered. The existing registration is untouched.
    pub fn register(&self, name: impl Into<String>, factory: ToolFactory) -> bool {
        let name = name.into();
        if name.is_empty() {
            self.reporter
                .report(&CadreError::invalid_argument("tool name must not be empty"));
            return false;
        }

        let mut tools = self.write();
        if tools.contains_key(&name) {
            drop(tools);
            self.reporter.report(&CadreError::invalid_argument(format!(
                "tool '{name}' is already registered"
            )));
            return false;
        }
        tools.insert(
            name.clone(),
            Registration {
                factory,
                instance: None,
            },
        );
        drop(tools);

        debug!(tool = %name, "Registered tool");
        true
    }

    /// Register a typed factory under `name`.
    pub fn register_tool<T, F>(&self, name: impl Into<String>, factory: F) -> bool
    where
        T: Any + Send + Sync,
        F: Fn(Option<&str>) -> T + Send + Sync + 'static,
    {
        self.register(name, Arc::new(move |id: Option<&str>| Arc::new(factory(id)) as Tool))
    }

    /// Get the tool registered under `name`, constructing it on first use.
    ///
    /// Returns `None` if `name` was never registered.
    pub fn request(&self, name: &str, tool_id: Option<&str>) -> Option<Tool> {
        let factory = {
            let tools = self.read();
            let registration = tools.get(name)?;
            if let Some(tool) = &registration.instance {
                trace!(tool = name, "Tool cache hit");
                return Some(Arc::clone(tool));
            }
            Arc::clone(&registration.factory)
        };

        // The factory runs unlocked so it may request other tools.
        let built = factory(tool_id);

        let mut tools = self.write();
        match tools.get_mut(name) {
            Some(registration) if Arc::ptr_eq(&registration.factory, &factory) => {
                let tool = registration.instance.get_or_insert(built);
                debug!(tool = name, tool_id = ?tool_id, "Constructed tool");
                Some(Arc::clone(tool))
            },
            // Unregistered or replaced while the factory ran.
            _ => Some(built),
        }
    }

    /// Typed [`request`](Self::request).
    ///
    /// Returns `None` if `name` is unknown or the tool is not a `T`.
    pub fn request_as<T: Any + Send + Sync>(
        &self,
        name: &str,
        tool_id: Option<&str>,
    ) -> Option<Arc<T>> {
        self.request(name, tool_id)?.downcast::<T>().ok()
    }

    /// Remove a registration and its cached instance.
    ///
    /// Holders of the instance keep their handle.
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.write().remove(name).is_some();
        if removed {
            debug!(tool = name, "Unregistered tool");
        }
        removed
    }

    /// Whether a factory is registered under `name`.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of tools constructed and cached.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.read().values().filter(|r| r.instance.is_some()).count()
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("tools", &self.names())
            .field("cached", &self.cached_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadre_core::ErrorSink;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Capture(Mutex<Vec<String>>);

    impl ErrorSink for Capture {
        fn log(&self, message: &str, _context: Option<&Value>) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn toolbox() -> (Toolbox, Arc<Capture>) {
        let sink = Arc::new(Capture::default());
        let reporter = Reporter::new(Arc::clone(&sink) as Arc<dyn ErrorSink>, false);
        (Toolbox::new(Arc::new(reporter)), sink)
    }

    struct Counter(usize);

    #[test]
    fn test_factory_runs_once() {
        let (toolbox, _) = toolbox();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        toolbox.register_tool("counter", move |_| {
            Counter(calls_clone.fetch_add(1, Ordering::SeqCst))
        });

        let a = toolbox.request("counter", None).unwrap();
        let b = toolbox.request("counter", None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(toolbox.cached_count(), 1);
    }

    #[test]
    fn test_tool_id_does_not_split_cache() {
        let (toolbox, _) = toolbox();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        toolbox.register_tool("named", move |id: Option<&str>| {
            seen_clone.lock().unwrap().push(id.map(str::to_string));
            id.unwrap_or("none").to_string()
        });

        let first = toolbox.request_as::<String>("named", Some("a")).unwrap();
        let second = toolbox.request_as::<String>("named", Some("b")).unwrap();
        assert_eq!(*first, "a");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*seen.lock().unwrap(), vec![Some("a".to_string())]);
    }

    #[test]
    fn test_unknown_name_yields_none() {
        let (toolbox, sink) = toolbox();
        assert!(toolbox.request("missing", None).is_none());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_register_reports_and_keeps_original() {
        let (toolbox, sink) = toolbox();
        assert!(toolbox.register_tool("storage", |_| Counter(1)));
        assert!(!toolbox.register_tool("storage", |_| Counter(2)));

        let tool = toolbox.request_as::<Counter>("storage", None).unwrap();
        assert_eq!(tool.0, 1);
        let messages = sink.0.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("already registered"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let (toolbox, sink) = toolbox();
        assert!(!toolbox.register_tool("", |_| Counter(0)));
        assert!(toolbox.is_empty());
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_request_as_wrong_type() {
        let (toolbox, _) = toolbox();
        toolbox.register_tool("counter", |_| Counter(0));
        assert!(toolbox.request_as::<String>("counter", None).is_none());
        assert!(toolbox.request_as::<Counter>("counter", None).is_some());
    }

    #[test]
    fn test_factory_may_request_other_tools() {
        let (toolbox, _) = toolbox();
        let toolbox = Arc::new(toolbox);
        toolbox.register_tool("base", |_| Counter(10));

        let inner = Arc::downgrade(&toolbox);
        toolbox.register_tool("derived", move |_| {
            let base = inner
                .upgrade()
                .and_then(|tb| tb.request_as::<Counter>("base", None))
                .map_or(0, |c| c.0);
            Counter(base.saturating_add(1))
        });

        let derived = toolbox.request_as::<Counter>("derived", None).unwrap();
        assert_eq!(derived.0, 11);
        assert_eq!(toolbox.cached_count(), 2);
    }

    #[test]
    fn test_unregister_drops_cache() {
        let (toolbox, _) = toolbox();
        toolbox.register_tool("temp", |_| Counter(0));
        let held = toolbox.request("temp", None).unwrap();

        assert!(toolbox.unregister("temp"));
        assert!(!toolbox.unregister("temp"));
        assert!(!toolbox.is_registered("temp"));
        assert!(toolbox.request("temp", None).is_none());
        assert!(held.downcast_ref::<Counter>().is_some());

        // The name is free again.
        assert!(toolbox.register_tool("temp", |_| Counter(5)));
        assert_eq!(toolbox.request_as::<Counter>("temp", None).unwrap().0, 5);
    }

    #[test]
    fn test_names_sorted() {
        let (toolbox, _) = toolbox();
        toolbox.register_tool("zeta", |_| Counter(0));
        toolbox.register_tool("alpha", |_| Counter(0));
        assert_eq!(toolbox.names(), vec!["alpha", "zeta"]);
        assert_eq!(toolbox.len(), 2);
    }
}
