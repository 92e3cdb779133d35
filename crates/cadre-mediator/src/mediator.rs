//! Topic-keyed publish/subscribe with per-owner revocation.

use std::collections::{BTreeMap, HashMap};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use cadre_core::{CadreError, CadreResult, OwnerId, Reporter, panic_message};

use crate::event::{Delivery, TopicEvent};
use crate::subscription::{
    Handler, HandlerResult, SubscriptionHandle, SubscriptionId, TopicMap,
};

/// What happens when a handler fails during publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// Report the failure and keep delivering to the remaining handlers.
    #[default]
    Isolated,
    /// Report the failure, skip the remaining handlers and return the error.
    FailFast,
}

struct Subscriber {
    owner: Option<OwnerId>,
    handler: Handler,
}

#[derive(Default)]
struct MediatorState {
    /// Subscribers per topic, keyed by insertion sequence.
    topics: HashMap<String, BTreeMap<SubscriptionId, Arc<Subscriber>>>,
    /// Owner index: subscription → topic, for O(k) bulk revocation.
    owners: HashMap<OwnerId, HashMap<SubscriptionId, String>>,
    next_id: u64,
}

impl MediatorState {
    fn remove(&mut self, topic: &str, id: SubscriptionId) -> Option<Arc<Subscriber>> {
        let subscribers = self.topics.get_mut(topic)?;
        let removed = subscribers.remove(&id);
        if subscribers.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }
}

/// Synchronous publish/subscribe bus.
///
/// Locks are never held while a handler runs, so handlers are free to
/// subscribe, unsubscribe and publish re-entrantly.
pub struct Mediator {
    state: RwLock<MediatorState>,
    reporter: Arc<Reporter>,
    policy: DeliveryPolicy,
    published: AtomicU64,
}

impl Mediator {
    /// Create a mediator reporting handler failures through `reporter`.
    #[must_use]
    pub fn new(reporter: Arc<Reporter>, policy: DeliveryPolicy) -> Self {
        Self {
            state: RwLock::new(MediatorState::default()),
            reporter,
            policy,
            published: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MediatorState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MediatorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The failure policy this mediator was built with.
    #[must_use]
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Subscribe an unattributed handler to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`CadreError::InvalidArgument`] if `topic` is empty.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> CadreResult<SubscriptionHandle>
    where
        F: Fn(&mut TopicEvent) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(None, topic.into(), Arc::new(handler))
    }

    /// Subscribe a handler attributed to `owner`.
    ///
    /// The subscription is removed by [`unsubscribe_all`](Self::unsubscribe_all)
    /// for that owner.
    ///
    /// # Errors
    ///
    /// Returns [`CadreError::InvalidArgument`] if `topic` is empty.
    pub fn subscribe_owned<F>(
        &self,
        owner: OwnerId,
        topic: impl Into<String>,
        handler: F,
    ) -> CadreResult<SubscriptionHandle>
    where
        F: Fn(&mut TopicEvent) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(Some(owner), topic.into(), Arc::new(handler))
    }

    /// Subscribe an already-shared handler.
    ///
    /// # Errors
    ///
    /// Returns [`CadreError::InvalidArgument`] if `topic` is empty.
    pub fn subscribe_shared(
        &self,
        owner: Option<OwnerId>,
        topic: impl Into<String>,
        handler: Handler,
    ) -> CadreResult<SubscriptionHandle> {
        self.insert(owner, topic.into(), handler)
    }

    /// Subscribe every entry of a topic map, in declaration order.
    ///
    /// The map is validated up front: if any topic is empty nothing is
    /// subscribed.
    ///
    /// # Errors
    ///
    /// Returns [`CadreError::InvalidArgument`] if any topic is empty.
    pub fn subscribe_map(
        &self,
        owner: Option<OwnerId>,
        map: TopicMap,
    ) -> CadreResult<Vec<SubscriptionHandle>> {
        if map.topics().any(str::is_empty) {
            return Err(self.rejected("topic map contains an empty topic"));
        }
        map.into_entries()
            .into_iter()
            .map(|(topic, handler)| self.insert(owner, topic, handler))
            .collect()
    }

    /// Report an invalid subscription and hand the error back.
    fn rejected(&self, message: &str) -> CadreError {
        let err = CadreError::invalid_argument(message);
        self.reporter.report(&err);
        err
    }

    fn insert(
        &self,
        owner: Option<OwnerId>,
        topic: String,
        handler: Handler,
    ) -> CadreResult<SubscriptionHandle> {
        if topic.is_empty() {
            return Err(self.rejected("topic must not be empty"));
        }

        let mut state = self.write();
        let id = SubscriptionId(state.next_id);
        state.next_id = state.next_id.saturating_add(1);

        state
            .topics
            .entry(topic.clone())
            .or_default()
            .insert(id, Arc::new(Subscriber { owner, handler }));
        if let Some(owner) = owner {
            state
                .owners
                .entry(owner)
                .or_default()
                .insert(id, topic.clone());
        }
        drop(state);

        debug!(topic = %topic, subscription = %id, owner = ?owner, "Subscribed");
        Ok(SubscriptionHandle::new(id, topic, owner))
    }

    /// Remove one registration.
    ///
    /// Returns `false` if the subscription was already removed.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut state = self.write();
        let Some(removed) = state.remove(handle.topic(), handle.id()) else {
            trace!(subscription = %handle.id(), "Unsubscribe of stale handle ignored");
            return false;
        };

        if let Some(owner) = removed.owner {
            if let Some(owned) = state.owners.get_mut(&owner) {
                owned.remove(&handle.id());
                if owned.is_empty() {
                    state.owners.remove(&owner);
                }
            }
        }
        drop(state);

        debug!(topic = %handle.topic(), subscription = %handle.id(), "Unsubscribed");
        true
    }

    /// Remove every registration attributed to `owner`.
    ///
    /// Runs in time proportional to that owner's subscription count.
    /// Returns the number of subscriptions removed.
    pub fn unsubscribe_all(&self, owner: OwnerId) -> usize {
        let mut state = self.write();
        let Some(owned) = state.owners.remove(&owner) else {
            return 0;
        };

        let mut removed: usize = 0;
        for (id, topic) in owned {
            if state.remove(&topic, id).is_some() {
                removed = removed.saturating_add(1);
            }
        }
        drop(state);

        debug!(owner = %owner, removed, "Revoked all owner subscriptions");
        removed
    }

    /// Publish `data` on `topic`.
    ///
    /// Every handler registered for `topic` when the call starts is invoked
    /// in registration order with the same [`TopicEvent`]. Handler errors and
    /// panics are reported through the reporter as
    /// [`CadreError::HandlerFailure`].
    ///
    /// # Errors
    ///
    /// Under [`DeliveryPolicy::FailFast`], returns the first handler failure
    /// after skipping the remaining handlers.
    pub fn publish(&self, topic: &str, data: Value) -> CadreResult<Delivery> {
        let snapshot: Vec<(SubscriptionId, Arc<Subscriber>)> = self
            .read()
            .topics
            .get(topic)
            .map(|subs| subs.iter().map(|(id, s)| (*id, Arc::clone(s))).collect())
            .unwrap_or_default();

        self.published.fetch_add(1, Ordering::Relaxed);
        trace!(topic, subscribers = snapshot.len(), "Publishing");

        let mut delivery = Delivery::new(TopicEvent::new(topic, data));
        for (id, subscriber) in snapshot {
            let event = &mut delivery.event;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (subscriber.handler)(event)));
            delivery.invoked = delivery.invoked.saturating_add(1);

            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };

            let err = CadreError::HandlerFailure {
                topic: topic.to_string(),
                subscription: id.get(),
                message,
            };
            warn!(topic, subscription = %id, error = %err, "Handler failed");
            self.reporter.report(&err);
            delivery.failed = delivery.failed.saturating_add(1);

            if self.policy == DeliveryPolicy::FailFast {
                return Err(err);
            }
        }

        debug!(
            topic,
            invoked = delivery.invoked,
            failed = delivery.failed,
            "Published"
        );
        Ok(delivery)
    }

    /// Number of subscriptions on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.read().topics.get(topic).map_or(0, BTreeMap::len)
    }

    /// Number of subscriptions attributed to `owner`.
    #[must_use]
    pub fn owned_count(&self, owner: OwnerId) -> usize {
        self.read().owners.get(&owner).map_or(0, HashMap::len)
    }

    /// Total number of live subscriptions.
    #[must_use]
    pub fn total_subscriptions(&self) -> usize {
        self.read().topics.values().map(BTreeMap::len).sum()
    }

    /// Topics with at least one subscriber, sorted.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.read().topics.keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Number of publish calls made so far.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Remove every subscription.
    pub fn clear(&self) {
        let mut state = self.write();
        state.topics.clear();
        state.owners.clear();
        debug!("All subscriptions cleared");
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("Mediator")
            .field("policy", &self.policy)
            .field("topic_count", &state.topics.len())
            .field("owner_count", &state.owners.len())
            .finish_non_exhaustive()
    }
}
