//! Subscription handles, handler types and topic maps.

use std::fmt;
use std::sync::Arc;

use cadre_core::OwnerId;

use crate::event::TopicEvent;

/// Error returned by a handler to signal a delivery failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Create a handler error with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Result type returned by handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// A shared topic handler.
pub type Handler = Arc<dyn Fn(&mut TopicEvent) -> HandlerResult + Send + Sync>;

/// Insertion sequence number of a subscription.
///
/// Sequence numbers grow monotonically per mediator, so ordering by ID is
/// ordering by registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// The raw sequence number.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle that removes exactly one registration.
///
/// Removing through a stale handle is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    topic: String,
    owner: Option<OwnerId>,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: SubscriptionId, topic: String, owner: Option<OwnerId>) -> Self {
        Self { id, topic, owner }
    }

    /// Subscription sequence number.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Topic this subscription listens on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Owner the subscription is attributed to, if any.
    #[must_use]
    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }
}

/// An ordered topic → handler table.
///
/// Entries are subscribed in the order they were added.
#[derive(Default, Clone)]
pub struct TopicMap {
    entries: Vec<(String, Handler)>,
}

impl TopicMap {
    /// Create an empty topic map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a topic and its handler.
    #[must_use]
    pub fn on<F>(mut self, topic: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut TopicEvent) -> HandlerResult + Send + Sync + 'static,
    {
        self.entries.push((topic.into(), Arc::new(handler)));
        self
    }

    /// Append an already-shared handler.
    #[must_use]
    pub fn on_shared(mut self, topic: impl Into<String>, handler: Handler) -> Self {
        self.entries.push((topic.into(), handler));
        self
    }

    /// Topics in declaration order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(topic, _)| topic.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Handler)> {
        self.entries
    }
}

impl fmt::Debug for TopicMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicMap")
            .field("topics", &self.topics().collect::<Vec<_>>())
            .finish()
    }
}
