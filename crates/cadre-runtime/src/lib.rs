//! Cadre Runtime - module lifecycle, sandboxes and wiring.
//!
//! This crate provides:
//! - [`ModuleRegistry`]: definitions plus the
//!   `Instantiated → Started ⇄ Stopped → destroyed` state machine
//! - [`Module`]: the hook contract, with [`HookModule`] for closures
//! - [`Sandbox`]: the per-instance facade over the mediator and the
//!   whitelisted capabilities
//! - [`Runtime`]: one explicitly constructed owner of every registry
//!
//! # Example
//!
//! ```rust
//! use cadre_runtime::{HookModule, InstanceState, Runtime, RuntimeConfig};
//! use serde_json::json;
//!
//! struct Storage;
//!
//! let runtime = Runtime::new(RuntimeConfig::default());
//! runtime.toolbox().register_tool("storage", |_| Storage);
//!
//! runtime.registry().define("logger", ["storage"], |deps| {
//!     assert!(deps.tool::<Storage>("storage").is_some());
//!     HookModule::new()
//!         .with_start(|sandbox, data| {
//!             sandbox.subscribe("log", |_| Ok(())).unwrap();
//!             assert_eq!(data["level"], "info");
//!         })
//!         .boxed()
//! });
//!
//! let registry = runtime.registry();
//! registry.start("logger", None, &json!({"level": "info"})).unwrap();
//! registry.stop("logger", None, false).unwrap();
//! assert_eq!(registry.instance("logger", None).unwrap().state, InstanceState::Stopped);
//! assert_eq!(runtime.mediator().total_subscriptions(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod prelude;

mod dependency;
mod module;
mod registry;
mod runtime;
mod sandbox;

pub use dependency::{Dependencies, Dependency};
pub use module::{Creator, HookModule, Module, ModuleDefinition};
pub use registry::{InstanceHandle, InstanceRecord, InstanceState, ModuleInfo, ModuleRegistry};
pub use runtime::{Runtime, RuntimeConfig};
pub use sandbox::{Capability, Sandbox, SandboxFactory};

// Re-export the shared building blocks for convenience
pub use cadre_core::{self, CadreError, CadreResult, ErrorSink, OwnerId, Reporter};
pub use cadre_mediator::{self, DeliveryPolicy, Mediator, TopicEvent, TopicMap};
pub use cadre_toolbox::{self, Tool, Toolbox};
