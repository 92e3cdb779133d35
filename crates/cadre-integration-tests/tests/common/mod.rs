//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use cadre_runtime::Runtime;
use cadre_test::{Journal, RecordingModule};

/// A toy storage tool handed to modules as a dependency.
#[derive(Debug)]
#[allow(dead_code)]
pub struct Storage {
    /// The id the factory was asked to build for.
    pub built_for: Option<String>,
}

/// Register a `storage` tool that counts factory invocations.
#[allow(dead_code)]
pub fn register_storage(runtime: &Runtime, calls: &'static AtomicUsize) -> bool {
    runtime.toolbox().register_tool("storage", move |id| {
        calls.fetch_add(1, Ordering::SeqCst);
        Storage {
            built_for: id.map(str::to_owned),
        }
    })
}

/// Define `name` as a [`RecordingModule`] listening on `topics`.
#[allow(dead_code)]
pub fn define_recording(runtime: &Runtime, name: &str, journal: &Journal, topics: &[&str]) -> bool {
    let journal = journal.clone();
    let label = name.to_owned();
    let topics: Vec<String> = topics.iter().map(|t| (*t).to_owned()).collect();
    runtime
        .registry()
        .define(name, Vec::<String>::new(), move |_| {
            topics
                .iter()
                .fold(RecordingModule::new(label.clone(), &journal), |module, topic| {
                    module.listening_to(topic.clone())
                })
                .boxed()
        })
}
