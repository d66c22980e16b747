//! Durable snapshots of store contents.
//!
//! A persistent store is hydrated from its backend once, when it is built,
//! and writes the full value map back after every accepted change.

mod backend;
mod snapshot;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub(crate) use snapshot::{hydrate, persist};
