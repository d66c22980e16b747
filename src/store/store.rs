use super::{Binding, Slot, States, StoreId};
use crate::config::{ReducerScope, StoreConfig};
use crate::error::{require_name, Error, Result};
use crate::events::notification_key;
use crate::persist::{self, StorageBackend};
use crate::reducer::{ReducerHandle, ReducerSlot};
use crate::runtime::Runtime;
use crate::sync;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Predicate deciding whether a write of `(key, value)` is accepted.
pub type Validator = Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>;

struct Inner {
    id: StoreId,
    states: States,
    validator: Option<Validator>,
    runtime: Arc<Runtime>,
    reducer_scope: ReducerScope,
    backend: Option<Arc<dyn StorageBackend>>,
    // Held from the insert until the snapshot is written
    write_lock: Mutex<()>,
}

/// A keyed state container.
///
/// Every write goes through [`on_change`](Store::on_change), which checks
/// the validator, stores the value, persists the snapshot (persistent stores
/// only) and then notifies listeners and reducer subscribers of the key.
/// Cloning a `Store` yields another handle to the same container.
///
/// # Examples
///
/// ```
/// use keycan::Store;
/// use serde_json::json;
///
/// let store = Store::new(json!({ "count": 0 })).unwrap();
/// let binding = store.subscribe("count").unwrap();
/// assert_eq!(binding.key(), "count");
/// assert_eq!(*binding.value(), json!(0));
///
/// binding.on_change("count", json!(5)).unwrap();
/// assert_eq!(store.get_state("count").unwrap(), json!(5));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    /// Create a store holding `defaults`, which must be a JSON object.
    pub fn new(defaults: Value) -> Result<Self> {
        Self::builder().defaults(defaults).build()
    }

    /// Create a store whose writes are gated by `validator`.
    pub fn with_validator<F>(defaults: Value, validator: F) -> Result<Self>
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        Self::builder().defaults(defaults).validator(validator).build()
    }

    /// Create a store persisted in `backend` under `store_id`.
    ///
    /// Values found in the backend override `defaults`.
    pub fn persistent<B>(store_id: impl Into<String>, defaults: Value, backend: B) -> Result<Self>
    where
        B: StorageBackend + 'static,
    {
        Self::builder()
            .id(store_id)
            .defaults(defaults)
            .backend(backend)
            .build()
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub fn id(&self) -> &StoreId {
        &self.inner.id
    }

    /// The runtime this store publishes notifications and reducers into.
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.inner.runtime
    }

    pub fn is_persistent(&self) -> bool {
        self.inner.backend.is_some()
    }

    /// Current value of `key`, `Slot::Absent` if it was never set.
    pub fn get_state(&self, key: &str) -> Result<Slot> {
        require_name("state", key)?;
        Ok(self.inner.states.get(key))
    }

    /// Live handle onto the whole value map.
    pub fn get_states(&self) -> States {
        self.inner.states.clone()
    }

    /// Write `value` to `key` if the validator accepts it.
    ///
    /// Returns `Ok(false)` when the validator rejects the write; nothing is
    /// stored or notified in that case. For persistent stores a failing
    /// backend write is returned as an error after the in-memory value has
    /// been updated and before any listener runs.
    pub fn on_change(&self, key: &str, value: Value) -> Result<bool> {
        require_name("state", key)?;
        let inner = &self.inner;

        if let Some(validator) = &inner.validator {
            if !validator(key, &value) {
                debug!(store_id = %inner.id, key, "change rejected by validator");
                return Ok(false);
            }
        }

        {
            let _guard = sync::lock(&inner.write_lock);
            inner.states.insert(key, value.clone());
            if let Some(backend) = &inner.backend {
                persist::persist(inner.id.as_str(), backend.as_ref(), &inner.states)?;
            }
        }

        inner
            .runtime
            .notifications()
            .emit(&notification_key(inner.id.as_str(), key), &value);
        inner
            .runtime
            .reducers()
            .notify(&self.reducer_slot(key), &value);
        Ok(true)
    }

    /// Binding descriptor for `key`, initializing it to `Absent` if missing.
    pub fn subscribe(&self, key: &str) -> Result<Binding> {
        require_name("state", key)?;
        let slot = self.inner.states.get_or_init(key);
        Ok(Binding::new(self.clone(), key.to_string(), slot))
    }

    /// Reducer controls for `key`.
    pub fn reducer(&self, key: &str) -> Result<ReducerHandle> {
        require_name("state", key)?;
        Ok(ReducerHandle::new(self.clone(), key.to_string()))
    }

    pub(crate) fn reducer_slot(&self, key: &str) -> ReducerSlot {
        match self.inner.reducer_scope {
            ReducerScope::PerStore => ReducerSlot::scoped(self.inner.id.as_str(), key),
            ReducerScope::Shared => ReducerSlot::shared(key),
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("states", &self.inner.states)
            .field("reducer_scope", &self.inner.reducer_scope)
            .field("persistent", &self.is_persistent())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Store`].
pub struct StoreBuilder {
    id: Option<String>,
    defaults: Value,
    validator: Option<Validator>,
    runtime: Option<Arc<Runtime>>,
    backend: Option<Arc<dyn StorageBackend>>,
    config: StoreConfig,
}

impl StoreBuilder {
    fn new() -> Self {
        Self {
            id: None,
            defaults: Value::Object(Map::new()),
            validator: None,
            runtime: None,
            backend: None,
            config: StoreConfig::default(),
        }
    }

    /// Use a fixed store id instead of a generated one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Initial values; must be a JSON object.
    pub fn defaults(mut self, defaults: Value) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Publish into `runtime` instead of [`Runtime::current`].
    pub fn runtime(mut self, runtime: Arc<Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Persist the store in `backend`.
    pub fn backend<B>(self, backend: B) -> Self
    where
        B: StorageBackend + 'static,
    {
        self.shared_backend(Arc::new(backend))
    }

    /// Persist the store in a backend shared with other stores.
    pub fn shared_backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reducer_scope(mut self, scope: ReducerScope) -> Self {
        self.config.reducer_scope = scope;
        self
    }

    /// Validate the arguments, hydrate persistent stores and create the store.
    pub fn build(self) -> Result<Store> {
        let id = match self.id {
            Some(id) => StoreId::new(id)?,
            None => StoreId::generate(self.config.id_length)?,
        };

        let defaults = match self.defaults {
            Value::Object(object) => object,
            _ => return Err(Error::invalid("default store must be a JSON object")),
        };

        let states = States::from_object(defaults);
        if let Some(backend) = &self.backend {
            persist::hydrate(id.as_str(), backend.as_ref(), &states)?;
        }

        debug!(
            store_id = %id,
            keys = states.len(),
            persistent = self.backend.is_some(),
            reducer_scope = ?self.config.reducer_scope,
            "store created"
        );

        Ok(Store {
            inner: Arc::new(Inner {
                id,
                states,
                validator: self.validator,
                runtime: self.runtime.unwrap_or_else(Runtime::current),
                reducer_scope: self.config.reducer_scope,
                backend: self.backend,
                write_lock: Mutex::new(()),
            }),
        })
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
