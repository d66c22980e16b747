use crate::sync;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Contents of one state key.
///
/// `Absent` marks a key that exists in the store but was never written
/// (created by [`Store::subscribe`]); it is distinct from `Set(Value::Null)`.
///
/// [`Store::subscribe`]: crate::Store::subscribe
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Slot {
    #[default]
    Absent,
    Set(Value),
}

impl Slot {
    pub fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Absent => None,
            Slot::Set(value) => Some(value),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Slot::Absent => None,
            Slot::Set(value) => Some(value),
        }
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Set(value)
    }
}

impl PartialEq<Value> for Slot {
    fn eq(&self, other: &Value) -> bool {
        self.as_value() == Some(other)
    }
}

/// Live view of a store's value map.
///
/// Cloning shares the underlying map: writes through the store are visible
/// through every `States` handle.
#[derive(Clone, Debug, Default)]
pub struct States {
    map: Arc<RwLock<HashMap<String, Slot>>>,
}

impl States {
    pub(crate) fn from_object(object: Map<String, Value>) -> Self {
        let map = object
            .into_iter()
            .map(|(key, value)| (key, Slot::Set(value)))
            .collect();
        Self {
            map: Arc::new(RwLock::new(map)),
        }
    }

    /// Current slot for `key`; missing keys read as `Absent`.
    pub fn get(&self, key: &str) -> Slot {
        sync::read(&self.map).get(key).cloned().unwrap_or_default()
    }

    /// Whether `key` exists in the map (possibly as `Absent`).
    pub fn contains_key(&self, key: &str) -> bool {
        sync::read(&self.map).contains_key(key)
    }

    pub fn len(&self) -> usize {
        sync::read(&self.map).len()
    }

    pub fn is_empty(&self) -> bool {
        sync::read(&self.map).is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        sync::read(&self.map).keys().cloned().collect()
    }

    /// Read a snapshot of the map with a function.
    ///
    /// The snapshot is taken before `f` runs and no lock is held while it
    /// runs, so `f` may write to the store; those writes are not visible in
    /// the snapshot.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&HashMap<String, Slot>) -> R,
    {
        let snapshot = sync::read(&self.map).clone();
        f(&snapshot)
    }

    /// JSON object of every set key. `Absent` keys are omitted.
    pub fn to_json(&self) -> Value {
        let map = sync::read(&self.map);
        let object: Map<String, Value> = map
            .iter()
            .filter_map(|(key, slot)| slot.as_value().map(|v| (key.clone(), v.clone())))
            .collect();
        Value::Object(object)
    }

    /// Whether two handles view the same map.
    pub fn ptr_eq(&self, other: &States) -> bool {
        Arc::ptr_eq(&self.map, &other.map)
    }

    pub(crate) fn insert(&self, key: &str, value: Value) {
        sync::write(&self.map).insert(key.to_string(), Slot::Set(value));
    }

    /// Overlay `object` onto the map; incoming values win.
    pub(crate) fn merge(&self, object: Map<String, Value>) {
        let mut map = sync::write(&self.map);
        for (key, value) in object {
            map.insert(key, Slot::Set(value));
        }
    }

    /// Ensure `key` exists, inserting `Absent` if missing, and return its slot.
    pub(crate) fn get_or_init(&self, key: &str) -> Slot {
        sync::write(&self.map)
            .entry(key.to_string())
            .or_default()
            .clone()
    }
}
