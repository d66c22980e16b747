//! Named notification channels.
//!
//! Stores publish every accepted write on the channel returned by
//! [`notification_key`]; UI adapters listen there.

mod registry;

pub use registry::{Listener, ListenerId, NotificationRegistry};

/// Channel name for updates of `state` in the store identified by `store_id`.
pub fn notification_key(store_id: &str, state: &str) -> String {
    format!("{store_id}-UPDATE-{state}")
}
