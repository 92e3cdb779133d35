//! Prelude module - commonly used types for convenient import.
//!
//! Use `use cadre_runtime::prelude::*;` to import all essential types.

// Runtime
pub use crate::{Runtime, RuntimeConfig};

// Modules
pub use crate::{
    Dependencies, Dependency, HookModule, InstanceRecord, InstanceState, Module, ModuleDefinition,
    ModuleRegistry,
};

// Sandboxes
pub use crate::{Capability, Sandbox, SandboxFactory};

// Shared building blocks
pub use cadre_core::prelude::*;
pub use cadre_mediator::prelude::*;
pub use cadre_toolbox::prelude::*;
