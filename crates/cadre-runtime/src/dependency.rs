//! Resolved module dependencies.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use cadre_toolbox::Tool;

/// One entry of a module's dependency list, as handed to its creator.
#[derive(Clone)]
pub enum Dependency {
    /// The name resolved to a registered tool.
    Tool {
        /// Tool name.
        name: String,
        /// The live, shared instance.
        tool: Tool,
    },
    /// No tool is registered under this name.
    Unresolved(String),
}

impl Dependency {
    /// The dependency name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Tool { name, .. } | Self::Unresolved(name) => name,
        }
    }

    /// Whether the name resolved to a tool.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Tool { .. })
    }

    /// The untyped tool, if resolved.
    #[must_use]
    pub fn tool(&self) -> Option<&Tool> {
        match self {
            Self::Tool { tool, .. } => Some(tool),
            Self::Unresolved(_) => None,
        }
    }

    /// The tool downcast to `T`.
    #[must_use]
    pub fn tool_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.tool().cloned()?.downcast::<T>().ok()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool { name, .. } => f.debug_struct("Tool").field("name", name).finish_non_exhaustive(),
            Self::Unresolved(name) => f.debug_tuple("Unresolved").field(name).finish(),
        }
    }
}

/// The ordered dependency list passed to a creator.
///
/// Order matches the definition's declared dependency names.
#[derive(Debug, Clone, Default)]
pub struct Dependencies(Vec<Dependency>);

impl Dependencies {
    pub(crate) fn new(entries: Vec<Dependency>) -> Self {
        Self(entries)
    }

    /// Entry at position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Dependency> {
        self.0.get(index)
    }

    /// First entry declared under `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Dependency> {
        self.0.iter().find(|d| d.name() == name)
    }

    /// Typed tool declared under `name`.
    #[must_use]
    pub fn tool<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.find(name)?.tool_as::<T>()
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Dependencies {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
