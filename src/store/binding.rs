use super::{Slot, States, Store, StoreId};
use crate::error::Result;
use crate::events::{notification_key, ListenerId};
use serde_json::Value;

/// Everything a UI adapter needs to bind one state key.
///
/// The adapter listens on [`channel`](Binding::channel) while mounted,
/// pushes local writes back through [`on_change`](Binding::on_change) and
/// removes its listener with [`off`](Binding::off) when unmounted.
///
/// `state` is the `(key, value)` pair captured when the binding was created;
/// the store handle and [`store`](Binding::store) map are live.
#[derive(Clone, Debug)]
pub struct Binding {
    store: Store,
    state: (String, Slot),
}

impl Binding {
    pub(crate) fn new(store: Store, key: String, slot: Slot) -> Self {
        Self {
            store,
            state: (key, slot),
        }
    }

    pub fn store_id(&self) -> &StoreId {
        self.store.id()
    }

    /// Live view of the store's value map.
    pub fn store(&self) -> States {
        self.store.get_states()
    }

    /// The store this binding was created from.
    pub fn handle(&self) -> &Store {
        &self.store
    }

    /// Key and value at subscribe time.
    pub fn state(&self) -> (&str, &Slot) {
        (&self.state.0, &self.state.1)
    }

    pub fn key(&self) -> &str {
        &self.state.0
    }

    /// Value of the key at subscribe time.
    pub fn value(&self) -> &Slot {
        &self.state.1
    }

    /// Notification channel for this binding's key.
    pub fn channel(&self) -> String {
        notification_key(self.store.id().as_str(), &self.state.0)
    }

    /// See [`Store::on_change`].
    pub fn on_change(&self, key: &str, value: Value) -> Result<bool> {
        self.store.on_change(key, value)
    }

    pub fn get_state(&self, key: &str) -> Result<Slot> {
        self.store.get_state(key)
    }

    pub fn get_states(&self) -> States {
        self.store.get_states()
    }

    /// Register a listener on `name` in the store's notification registry.
    pub fn on<F>(&self, name: &str, callback: F) -> Result<ListenerId>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.store.runtime().notifications().on(name, callback)
    }

    /// Remove one listener from `name`, or all of them when `id` is `None`.
    pub fn off(&self, name: &str, id: Option<ListenerId>) -> Result<()> {
        self.store.runtime().notifications().off(name, id)
    }
}
