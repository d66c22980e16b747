use super::{ReducerSlot, Subscription};
use crate::error::{BoxError, Error, Result};
use crate::store::{Slot, Store};
use serde_json::Value;
use std::sync::Arc;

/// Reducer controls for one key of a store.
///
/// # Examples
///
/// ```
/// use keycan::Store;
/// use serde_json::json;
///
/// let store = Store::new(json!({ "count": 0 })).unwrap();
/// let count = store.reducer("count").unwrap();
///
/// count.set(|current, action| {
///     let current = current.as_value().and_then(|v| v.as_i64()).unwrap_or(0);
///     match action["type"].as_str() {
///         Some("increment") => Ok(json!(current + 1)),
///         Some(other) => Err(format!("unknown action {other}").into()),
///         None => Err("missing action type".into()),
///     }
/// });
///
/// count.dispatch(json!({ "type": "increment" })).unwrap();
/// assert_eq!(store.get_state("count").unwrap(), json!(1));
/// ```
pub struct ReducerHandle {
    store: Store,
    key: String,
    slot: ReducerSlot,
}

impl ReducerHandle {
    pub(crate) fn new(store: Store, key: String) -> Self {
        let slot = store.reducer_slot(&key);
        Self { store, key, slot }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The registry slot this handle operates on.
    pub fn slot(&self) -> &ReducerSlot {
        &self.slot
    }

    /// Call `callback` with every accepted new value of the key.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.store
            .runtime()
            .reducers()
            .subscribe(&self.slot, Arc::new(callback))
    }

    /// Install the reducer for this key, replacing any previous one.
    pub fn set<F>(&self, reducer: F)
    where
        F: Fn(&Slot, &Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.store
            .runtime()
            .reducers()
            .set_reducer(&self.slot, Arc::new(reducer));
    }

    /// Run the reducer on the current value and `action`, then write the
    /// result through [`Store::on_change`].
    ///
    /// Returns whether the validator accepted the new value.
    pub fn dispatch(&self, action: Value) -> Result<bool> {
        let reducer = self
            .store
            .runtime()
            .reducers()
            .reducer(&self.slot)
            .ok_or_else(|| Error::NoReducerConfigured(self.key.clone()))?;

        let current = self.store.get_state(&self.key)?;
        let next = reducer(&current, &action).map_err(|e| Error::ReducerExecution(e.to_string()))?;
        self.store.on_change(&self.key, next)
    }
}
