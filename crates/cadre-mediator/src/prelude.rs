//! Prelude module - commonly used types for convenient import.
//!
//! Use `use cadre_mediator::prelude::*;` to import all essential types.

// Bus
pub use crate::{DeliveryPolicy, Mediator};

// Events
pub use crate::{Delivery, TopicEvent};

// Subscriptions
pub use crate::{Handler, HandlerError, HandlerResult, SubscriptionHandle, SubscriptionId, TopicMap};
