use crate::error::{require_name, Result};
use crate::sync;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Callback invoked with the new value of a state key.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle identifying one registered listener, used to remove it again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry mapping event names to ordered listener lists.
///
/// Fan-out iterates over a snapshot of the list taken when [`emit`] starts,
/// so listeners may add or remove listeners (including themselves) while
/// being notified.
///
/// [`emit`]: NotificationRegistry::emit
pub struct NotificationRegistry {
    next_id: AtomicU64,
    channels: RwLock<HashMap<String, Vec<(ListenerId, Listener)>>>,
}

impl NotificationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Append a listener to the channel `name`, creating the channel if needed.
    pub fn on<F>(&self, name: &str, callback: F) -> Result<ListenerId>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_listener(name, Arc::new(callback))
    }

    /// Like [`on`](Self::on), for an already shared listener.
    pub fn on_listener(&self, name: &str, listener: Listener) -> Result<ListenerId> {
        require_name("name", name)?;
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        sync::write(&self.channels)
            .entry(name.to_string())
            .or_default()
            .push((id, listener));
        Ok(id)
    }

    /// Remove one listener from `name`, or the whole channel when `id` is
    /// `None`. Unknown names and ids are ignored.
    pub fn off(&self, name: &str, id: Option<ListenerId>) -> Result<()> {
        require_name("name", name)?;
        let mut channels = sync::write(&self.channels);
        match id {
            Some(id) => {
                if let Some(listeners) = channels.get_mut(name) {
                    listeners.retain(|(existing, _)| *existing != id);
                }
            }
            None => {
                channels.remove(name);
            }
        }
        Ok(())
    }

    /// Invoke every listener registered under `name`, in registration order.
    pub fn emit(&self, name: &str, value: &Value) {
        let listeners: Vec<Listener> = match sync::read(&self.channels).get(name) {
            Some(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return,
        };

        trace!(channel = name, listeners = listeners.len(), "emit");
        for listener in listeners {
            listener(value);
        }
    }

    /// Number of listeners currently registered under `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        sync::read(&self.channels).get(name).map_or(0, Vec::len)
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
