//! Store configuration.

use serde::Deserialize;

/// Default length of generated store ids.
pub const DEFAULT_ID_LENGTH: usize = 5;

/// How reducer entries are keyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReducerScope {
    /// One reducer slot per `(store id, key)`.
    #[default]
    PerStore,
    /// One reducer slot per key, shared by every store in the runtime.
    Shared,
}

/// Options applied when building a store.
///
/// Deserializable so it can live in an application config file:
///
/// ```
/// use keycan::{ReducerScope, StoreConfig};
///
/// let config: StoreConfig = serde_json::from_str(r#"{ "reducer_scope": "shared" }"#).unwrap();
/// assert_eq!(config.reducer_scope, ReducerScope::Shared);
/// assert_eq!(config.id_length, 5);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Length of generated store ids.
    pub id_length: usize,
    pub reducer_scope: ReducerScope,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_length: DEFAULT_ID_LENGTH,
            reducer_scope: ReducerScope::PerStore,
        }
    }
}
