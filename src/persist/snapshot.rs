use super::StorageBackend;
use crate::error::{Error, Result};
use crate::store::States;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Decode a persisted blob into the object it must contain.
pub(crate) fn decode(store_id: &str, blob: &str) -> Result<Map<String, Value>> {
    let reason = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(object)) => return Ok(object),
        Ok(other) => format!("expected a JSON object, found {}", kind(&other)),
        Err(e) => e.to_string(),
    };
    Err(Error::PersistenceDecode {
        store_id: store_id.to_string(),
        reason,
    })
}

/// Overlay the snapshot stored under `store_id` onto `states`.
///
/// A snapshot that fails to decode is logged and ignored.
pub(crate) fn hydrate(store_id: &str, backend: &dyn StorageBackend, states: &States) -> Result<()> {
    let Some(blob) = backend.read(store_id)? else {
        debug!(store_id, "no persisted snapshot");
        return Ok(());
    };

    match decode(store_id, &blob) {
        Ok(object) => {
            debug!(store_id, keys = object.len(), "hydrated from persisted snapshot");
            states.merge(object);
        }
        Err(err) => {
            warn!(store_id, error = %err, "ignoring persisted snapshot");
        }
    }
    Ok(())
}

/// Write the full value map of `states` under `store_id`.
pub(crate) fn persist(store_id: &str, backend: &dyn StorageBackend, states: &States) -> Result<()> {
    let blob = serde_json::to_string(&states.to_json())?;
    backend.write(store_id, &blob)?;
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
