//! Registry lifecycle tests across the full runtime.

mod common;

use cadre_runtime::{CadreError, HookModule, InstanceState};
use cadre_test::{Journal, debug_runtime, quiet_runtime};
use serde_json::json;

use common::define_recording;

#[test]
fn test_undefined_module_raises_only_in_debug() {
    let (runtime, sink) = debug_runtime();
    let registry = runtime.registry();

    assert!(matches!(
        registry.instantiate("ghost", None),
        Err(CadreError::UndefinedModule { ref name }) if name == "ghost"
    ));
    assert!(registry.start("ghost", None, &json!({})).is_err());
    assert!(registry.stop("ghost", None, true).is_err());
    assert_eq!(sink.len(), 3);

    let (runtime, sink) = quiet_runtime();
    let registry = runtime.registry();
    assert!(registry.instantiate("ghost", None).unwrap().is_none());
    assert!(!registry.start("ghost", None, &json!({})).unwrap());
    assert!(!registry.stop("ghost", None, false).unwrap());
    assert_eq!(sink.len(), 3);
    assert!(sink.contains("ghost"));
}

#[test]
fn test_duplicate_define_keeps_original() {
    let (runtime, sink) = debug_runtime();
    let first = Journal::new();
    let second = Journal::new();

    assert!(define_recording(&runtime, "worker", &first, &[]));
    assert!(!define_recording(&runtime, "worker", &second, &[]));
    assert_eq!(sink.len(), 1);

    runtime.registry().start("worker", None, &json!({})).unwrap();
    assert_eq!(first.entries(), vec!["worker:start"]);
    assert!(second.entries().is_empty());
}

#[test]
fn test_double_start_runs_hook_once() {
    let (runtime, _sink) = debug_runtime();
    let journal = Journal::new();
    define_recording(&runtime, "worker", &journal, &[]);

    assert!(runtime.registry().start("worker", None, &json!({})).unwrap());
    assert!(!runtime.registry().start("worker", None, &json!({})).unwrap());
    assert_eq!(journal.count("worker:start"), 1);
}

#[test]
fn test_destroy_runs_hooks_in_order_and_frees_name() {
    let (runtime, _sink) = debug_runtime();
    let journal = Journal::new();
    define_recording(&runtime, "worker", &journal, &[]);
    let registry = runtime.registry();

    registry.start("worker", None, &json!({})).unwrap();
    assert!(registry.stop("worker", None, true).unwrap());

    assert_eq!(
        journal.entries(),
        vec!["worker:start", "worker:stop", "worker:destroy"]
    );
    assert!(registry.instance("worker", None).is_none());
    assert!(!registry.is_defined("worker"));
    assert!(define_recording(&runtime, "worker", &journal, &[]));
}

#[test]
fn test_destroy_without_start_skips_stop_hook() {
    let (runtime, _sink) = debug_runtime();
    let journal = Journal::new();
    define_recording(&runtime, "worker", &journal, &[]);
    let registry = runtime.registry();

    registry.instantiate("worker", None).unwrap();
    assert!(registry.stop("worker", None, true).unwrap());
    assert_eq!(journal.entries(), vec!["worker:destroy"]);
}

#[test]
fn test_definition_survives_until_last_instance_is_destroyed() {
    let (runtime, _sink) = debug_runtime();
    let journal = Journal::new();
    define_recording(&runtime, "worker", &journal, &[]);
    let registry = runtime.registry();

    registry.start("worker", Some("a"), &json!({})).unwrap();
    registry.start("worker", Some("b"), &json!({})).unwrap();

    registry.stop("worker", Some("a"), true).unwrap();
    assert!(registry.is_defined("worker"));
    assert_eq!(registry.instances("worker").len(), 1);

    registry.stop("worker", Some("b"), true).unwrap();
    assert!(!registry.is_defined("worker"));
}

#[test]
fn test_modules_reports_instance_states() {
    let (runtime, _sink) = debug_runtime();
    let journal = Journal::new();
    define_recording(&runtime, "alpha", &journal, &[]);
    define_recording(&runtime, "beta", &journal, &[]);
    let registry = runtime.registry();

    registry.instantiate("alpha", Some("one")).unwrap();
    registry.start("alpha", Some("two"), &json!({})).unwrap();

    let modules = registry.modules();
    assert_eq!(modules.keys().collect::<Vec<_>>(), vec!["alpha", "beta"]);
    assert_eq!(modules["alpha"].instances["one"], InstanceState::Instantiated);
    assert_eq!(modules["alpha"].instances["two"], InstanceState::Started);
    assert!(modules["beta"].instances.is_empty());
}

#[test]
fn test_start_all_and_shutdown() {
    let (runtime, _sink) = debug_runtime();
    let journal = Journal::new();
    define_recording(&runtime, "alpha", &journal, &["tick"]);
    define_recording(&runtime, "beta", &journal, &["tick"]);

    assert_eq!(runtime.start_all(&json!({})).unwrap(), 2);
    assert_eq!(runtime.mediator().subscriber_count("tick"), 2);

    assert_eq!(runtime.shutdown().unwrap(), 2);
    assert_eq!(runtime.mediator().total_subscriptions(), 0);
    assert!(runtime.registry().is_empty());
    assert_eq!(journal.count("alpha:destroy"), 1);
    assert_eq!(journal.count("beta:destroy"), 1);
}

#[test]
fn test_failing_module_degrades_gracefully_without_debug() {
    let (runtime, sink) = quiet_runtime();
    let journal = Journal::new();
    define_recording(&runtime, "healthy", &journal, &["tick"]);
    runtime.registry().define("broken", Vec::<String>::new(), |_| {
        HookModule::new()
            .with_start(|_, _| panic!("cannot open socket"))
            .boxed()
    });

    assert_eq!(runtime.start_all(&json!({})).unwrap(), 1);
    assert_eq!(
        runtime.registry().instance("broken", None).unwrap().state,
        InstanceState::Instantiated
    );
    assert_eq!(
        runtime.registry().instance("healthy", None).unwrap().state,
        InstanceState::Started
    );
    assert!(sink.contains("cannot open socket"));
    assert_eq!(
        sink.entries()[0].context.as_ref().unwrap()["kind"],
        "module_failure"
    );
}

#[test]
fn test_failing_module_raises_with_debug() {
    let (runtime, sink) = debug_runtime();
    runtime.registry().define("broken", Vec::<String>::new(), |_| {
        HookModule::new()
            .with_start(|_, _| panic!("cannot open socket"))
            .boxed()
    });

    assert!(matches!(
        runtime.registry().start("broken", None, &json!({})),
        Err(CadreError::ModuleFailure { stage: "start", .. })
    ));
    assert_eq!(sink.len(), 1);
}
