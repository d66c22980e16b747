//! Error types for keycan.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by reducer functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by stores, registries and storage backends.
///
/// A validator rejecting a write is not an error: the write is dropped
/// silently.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed key, name, store id or default store.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `dispatch` was called for a key with no reducer set.
    #[error("no reducer for handling dispatch on `{0}`")]
    NoReducerConfigured(String),

    /// The reducer returned an error during `dispatch`.
    #[error("reducer function error: {0}")]
    ReducerExecution(String),

    /// A persisted snapshot could not be decoded during hydration.
    #[error("failed to decode persisted snapshot for store `{store_id}`: {reason}")]
    PersistenceDecode { store_id: String, reason: String },

    /// The storage backend failed to read or write.
    #[error("storage backend error: {0}")]
    Storage(#[from] std::io::Error),

    /// The value map could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

/// Fail with `InvalidArgument` unless `value` is a non-empty string.
pub(crate) fn require_name(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid(format!("{what} must be a non-empty string")));
    }
    Ok(())
}
