//! # Keycan
//!
//! A keyed state container with validation, notifications and reducers,
//! meant to sit underneath a reactive UI layer.
//!
//! ## Stores
//!
//! - `Store` - Keyed JSON values behind a single mutation entry point
//! - `Validator` - Predicate that silently drops unwanted writes
//! - `Binding` - What a UI adapter needs to read, write and watch one key
//!
//! ## Reducers
//!
//! - `ReducerHandle` - Set a reducer for a key, dispatch actions, subscribe
//!   to the values it produces
//!
//! ## Persistence
//!
//! - `StorageBackend` - Blob storage a persistent store hydrates from and
//!   writes its full snapshot to after every accepted change
//!
//! Notification and reducer registries live in a [`Runtime`]: one global
//! runtime by default, or isolated runtimes for tests and embedding.
//!
//! ```
//! use keycan::Store;
//! use serde_json::json;
//!
//! let store = Store::new(json!({ "count": 0 })).unwrap();
//! let binding = store.subscribe("count").unwrap();
//! binding.on_change("count", json!(5)).unwrap();
//! assert_eq!(store.get_state("count").unwrap(), json!(5));
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod persist;
pub mod reducer;
pub mod runtime;
pub mod store;
mod sync;

// Re-export main types for convenience
pub use config::{ReducerScope, StoreConfig};
pub use error::{Error, Result};
pub use events::{notification_key, ListenerId, NotificationRegistry};
pub use persist::{FileBackend, MemoryBackend, StorageBackend};
pub use reducer::{ReducerHandle, Subscription};
pub use runtime::Runtime;
pub use store::{Binding, Slot, States, Store, StoreBuilder, StoreId, Validator};
