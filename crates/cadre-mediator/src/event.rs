//! Topic events and delivery outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The value every handler of a single publish call receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicEvent {
    /// Topic the event was published on.
    pub topic: String,
    /// Arbitrary payload.
    pub data: Value,
}

impl TopicEvent {
    /// Create a new topic event.
    #[must_use]
    pub fn new(topic: impl Into<String>, data: Value) -> Self {
        Self {
            topic: topic.into(),
            data,
        }
    }
}

/// Outcome of a completed publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Number of handlers invoked.
    pub invoked: usize,
    /// Number of handlers that failed (isolated delivery only).
    pub failed: usize,
    /// The event after every handler has seen it.
    pub event: TopicEvent,
}

impl Delivery {
    pub(crate) fn new(event: TopicEvent) -> Self {
        Self {
            invoked: 0,
            failed: 0,
            event,
        }
    }

    /// Whether every invoked handler succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_topic_event_serde() {
        let event = TopicEvent::new("todo:add", json!({"name": "milk", "id": 3}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["topic"], "todo:add");
        assert_eq!(json["data"]["id"], 3);
    }

    #[test]
    fn test_delivery_starts_clean() {
        let delivery = Delivery::new(TopicEvent::new("t", Value::Null));
        assert!(delivery.is_clean());
        assert_eq!(delivery.invoked, 0);
    }
}
