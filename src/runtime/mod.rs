//! Runtime support for stores.
//!
//! A runtime owns the notification and reducer registries that stores
//! publish into. It can be global, scoped to a closure, or injected.

mod context;

pub use context::Runtime;
