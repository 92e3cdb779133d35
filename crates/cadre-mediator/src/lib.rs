//! Cadre Mediator - publish/subscribe bus for the Cadre module runtime.
//!
//! This crate provides:
//! - [`Mediator`]: topic-keyed, synchronous publish/subscribe
//! - [`SubscriptionHandle`]: removes exactly one registration
//! - Owner attribution, so every subscription made on behalf of an
//!   [`OwnerId`](cadre_core::OwnerId) can be revoked as a set
//! - [`TopicMap`]: an ordered topic → handler table
//!
//! # Delivery
//!
//! `publish` runs to completion before returning. Handlers fire in
//! registration order over a snapshot taken when the call starts, so
//! handlers subscribing or unsubscribing during delivery only affect the
//! next publish. All handlers of one publish see the same [`TopicEvent`]
//! and may mutate its payload for those that follow.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cadre_core::{OwnerId, Reporter};
//! use cadre_mediator::{DeliveryPolicy, Mediator};
//! use serde_json::json;
//!
//! let mediator = Mediator::new(Arc::new(Reporter::default()), DeliveryPolicy::Isolated);
//! let owner = OwnerId::new();
//!
//! mediator
//!     .subscribe_owned(owner, "user:connected", |event| {
//!         event.data["seen"] = json!(true);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let delivery = mediator.publish("user:connected", json!({"username": "blake"})).unwrap();
//! assert_eq!(delivery.invoked, 1);
//! assert_eq!(delivery.event.data["seen"], true);
//!
//! assert_eq!(mediator.unsubscribe_all(owner), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod event;
mod mediator;
mod subscription;

pub use event::{Delivery, TopicEvent};
pub use mediator::{DeliveryPolicy, Mediator};
pub use subscription::{
    Handler, HandlerError, HandlerResult, SubscriptionHandle, SubscriptionId, TopicMap,
};
