//! Owner identity for attributable subscriptions.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity that mediator subscriptions are attributed to.
///
/// Every module instance gets a fresh `OwnerId` when it is created, so two
/// instances of the same definition never share a revocation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Create a new, unique owner ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_ids_are_unique() {
        let a = OwnerId::new();
        let b = OwnerId::new();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn test_owner_id_display_is_uuid() {
        let id = OwnerId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
