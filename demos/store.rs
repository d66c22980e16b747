//! Store example: bindings, reducers and a persistent store

use keycan::{MemoryBackend, Store, StorageBackend};
use serde_json::{json, Value};

fn main() -> keycan::Result<()> {
    println!("=== Store Example ===\n");

    // A store whose `count` must never go negative
    let store = Store::with_validator(json!({ "count": 0, "label": "clicks" }), |key, value| {
        key != "count" || value.as_i64().is_some_and(|n| n >= 0)
    })?;

    // What a UI adapter would do when mounting a component
    let binding = store.subscribe("count")?;
    let listener = binding.on(&binding.channel(), |value| {
        println!("count changed to {value}");
    })?;

    println!("Writing through the binding...");
    binding.on_change("count", json!(1))?;
    let accepted = binding.on_change("count", json!(-5))?;
    println!("negative count accepted: {accepted}");

    // Reducer for the same key
    let count = store.reducer("count")?;
    count.set(|current, action| {
        let current = current.as_value().and_then(Value::as_i64).unwrap_or(0);
        match action["type"].as_str() {
            Some("increment") => Ok(json!(current + 1)),
            Some("decrement") => Ok(json!(current - 1)),
            _ => Err(format!("unknown action {action}").into()),
        }
    });
    let subscription = count.subscribe(|value| println!("reducer produced {value}"));

    println!("\nDispatching actions...");
    count.dispatch(json!({ "type": "increment" }))?;
    count.dispatch(json!({ "type": "increment" }))?;
    if let Err(e) = count.dispatch(json!({ "type": "reset" })) {
        println!("dispatch failed: {e}");
    }

    // Unmount
    subscription.unsubscribe();
    binding.off(&binding.channel(), Some(listener))?;
    println!("\nFinal state: {:#}", store.get_states().to_json());

    // Persistent stores hydrate from and write back to their backend
    println!("\n=== Persistent Store ===\n");
    let backend = MemoryBackend::new();
    let prefs = Store::persistent("prefs", json!({ "theme": "light" }), backend.clone())?;
    prefs.on_change("theme", json!("dark"))?;
    println!("saved snapshot: {}", backend.read("prefs")?.unwrap_or_default());

    let reopened = Store::persistent("prefs", json!({ "theme": "light" }), backend)?;
    println!("theme after reopening: {:?}", reopened.get_state("theme")?);

    Ok(())
}
