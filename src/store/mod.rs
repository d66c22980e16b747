//! Keyed state containers.
//!
//! A [`Store`] maps state keys to JSON values, gates writes through a
//! validator and fans accepted writes out to listeners and reducer
//! subscribers. Persistent stores additionally mirror their contents into a
//! [`StorageBackend`](crate::persist::StorageBackend).

mod binding;
mod id;
mod state;
mod store;

pub use binding::Binding;
pub use id::StoreId;
pub use state::{Slot, States};
pub use store::{Store, StoreBuilder, Validator};
