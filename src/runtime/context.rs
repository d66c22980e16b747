use crate::events::NotificationRegistry;
use crate::reducer::ReducerRegistry;
use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

/// The registries shared by a group of stores.
///
/// Supports both a global runtime (default) and scoped runtimes for
/// isolation. Stores pick up [`Runtime::current`] at construction unless a
/// runtime is injected through [`StoreBuilder::runtime`].
///
/// # Examples
///
/// Using the default global runtime:
///
/// ```
/// use keycan::Store;
/// use serde_json::json;
///
/// let store = Store::new(json!({ "count": 0 })).unwrap();
/// assert_eq!(store.get_state("count").unwrap(), json!(0));
/// ```
///
/// Using scoped runtimes for isolation:
///
/// ```
/// use keycan::runtime::Runtime;
/// use keycan::Store;
/// use serde_json::json;
///
/// Runtime::scope(|| {
///     let store = Store::new(json!({ "count": 0 })).unwrap();
///     store.reducer("count").unwrap().set(|_, _| Ok(json!(1)));
/// });
/// // Runtime and all its registrations are dropped here
/// ```
///
/// [`StoreBuilder::runtime`]: crate::store::StoreBuilder::runtime
pub struct Runtime {
    notifications: NotificationRegistry,
    reducers: Arc<ReducerRegistry>,
}

// Thread-local stack for scoped runtimes
thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<Runtime>>> = const { RefCell::new(Vec::new()) };
}

impl Runtime {
    /// Create a new isolated runtime.
    pub fn new() -> Arc<Self> {
        Arc::new(Runtime {
            notifications: NotificationRegistry::new(),
            reducers: Arc::new(ReducerRegistry::new()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// Stores created inside `f` register their listeners and reducers in
    /// the fresh runtime, which is dropped once nothing references it.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// Get or create the process-wide runtime.
    pub fn global() -> Arc<Self> {
        static RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// Get the current runtime (innermost scoped runtime, or the global one).
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run a function with `runtime` as the current runtime.
    ///
    /// The runtime is popped again even if `f` panics.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// The notification registry of this runtime.
    pub fn notifications(&self) -> &NotificationRegistry {
        &self.notifications
    }

    /// The reducer registry of this runtime.
    pub fn reducers(&self) -> &Arc<ReducerRegistry> {
        &self.reducers
    }
}
