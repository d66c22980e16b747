use crate::error::{require_name, Error, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// Identifier of one store instance.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreId(String);

impl StoreId {
    /// Wrap a caller-supplied id. Fails on an empty string.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        require_name("store id", &id)?;
        Ok(Self(id))
    }

    /// Generate a random alphanumeric id of `length` characters.
    pub fn generate(length: usize) -> Result<Self> {
        if length == 0 {
            return Err(Error::invalid("store id length must be a positive integer"));
        }
        let id = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoreId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
