use crate::error::BoxError;
use crate::events::Listener;
use crate::store::Slot;
use crate::sync;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tracing::{debug, trace};

/// Reducer function: `(current, action) -> new value`.
pub type Reducer = Arc<dyn Fn(&Slot, &Value) -> Result<Value, BoxError> + Send + Sync>;

/// Identifies one reducer entry.
///
/// Scoped slots belong to a single store; shared slots are keyed by the
/// state name alone and are visible to every store using that name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReducerSlot {
    store_id: Option<String>,
    key: String,
}

impl ReducerSlot {
    /// Slot private to the store `store_id`.
    pub fn scoped(store_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            store_id: Some(store_id.into()),
            key: key.into(),
        }
    }

    /// Slot shared by every store with a `key` state.
    pub fn shared(key: impl Into<String>) -> Self {
        Self {
            store_id: None,
            key: key.into(),
        }
    }

    /// The state key this slot reduces.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ReducerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.store_id {
            Some(store_id) => write!(f, "{store_id}/{}", self.key),
            None => f.write_str(&self.key),
        }
    }
}

#[derive(Default)]
struct ReducerEntry {
    reducer: Option<Reducer>,
    subscribers: Vec<(u64, Listener)>,
}

/// Registry of reducers and reducer subscribers, one entry per slot.
pub struct ReducerRegistry {
    next_id: AtomicU64,
    entries: RwLock<HashMap<ReducerSlot, ReducerEntry>>,
}

impl ReducerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Install `reducer` for `slot`, replacing any previous one.
    pub fn set_reducer(&self, slot: &ReducerSlot, reducer: Reducer) {
        let replaced = sync::write(&self.entries)
            .entry(slot.clone())
            .or_default()
            .reducer
            .replace(reducer)
            .is_some();
        debug!(slot = %slot, replaced, "reducer set");
    }

    /// The reducer currently installed for `slot`.
    pub fn reducer(&self, slot: &ReducerSlot) -> Option<Reducer> {
        sync::read(&self.entries)
            .get(slot)
            .and_then(|entry| entry.reducer.clone())
    }

    pub fn has_reducer(&self, slot: &ReducerSlot) -> bool {
        self.reducer(slot).is_some()
    }

    /// Remove the reducer for `slot`, keeping its subscribers.
    pub fn clear_reducer(&self, slot: &ReducerSlot) {
        if let Some(entry) = sync::write(&self.entries).get_mut(slot) {
            entry.reducer = None;
        }
    }

    /// Append `listener` to the subscribers of `slot`.
    pub fn subscribe(self: &Arc<Self>, slot: &ReducerSlot, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        sync::write(&self.entries)
            .entry(slot.clone())
            .or_default()
            .subscribers
            .push((id, listener));

        Subscription {
            slot: slot.clone(),
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, slot: &ReducerSlot, id: u64) {
        if let Some(entry) = sync::write(&self.entries).get_mut(slot) {
            entry.subscribers.retain(|(existing, _)| *existing != id);
        }
    }

    /// Invoke every subscriber of `slot` with `value`, in subscription order.
    pub fn notify(&self, slot: &ReducerSlot, value: &Value) {
        let subscribers: Vec<Listener> = match sync::read(&self.entries).get(slot) {
            Some(entry) if !entry.subscribers.is_empty() => entry
                .subscribers
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect(),
            _ => return,
        };

        trace!(slot = %slot, subscribers = subscribers.len(), "notify reducer subscribers");
        for subscriber in subscribers {
            subscriber(value);
        }
    }

    /// Number of subscribers registered for `slot`.
    pub fn subscriber_count(&self, slot: &ReducerSlot) -> usize {
        sync::read(&self.entries)
            .get(slot)
            .map_or(0, |entry| entry.subscribers.len())
    }
}

impl Default for ReducerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by reducer subscriptions.
///
/// Dropping it keeps the subscription alive; call
/// [`unsubscribe`](Subscription::unsubscribe) to stop receiving values.
pub struct Subscription {
    slot: ReducerSlot,
    id: u64,
    registry: Weak<ReducerRegistry>,
}

impl Subscription {
    /// Remove exactly this subscriber. Calling it again does nothing.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(&self.slot, self.id);
        }
    }
}
