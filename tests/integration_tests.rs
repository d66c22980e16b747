//! Integration tests for Keycan

use keycan::{
    Error, FileBackend, MemoryBackend, ReducerScope, Runtime, Slot, StorageBackend, Store,
    Validator,
};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, OnceLock,
};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn counter() -> (Arc<AtomicUsize>, impl Fn(&Value) + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    (count, move |_: &Value| {
        count_clone.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn subscribe_and_change_scenario() {
    init_logging();
    let store = Store::new(json!({ "count": 0 })).unwrap();

    let binding = store.subscribe("count").unwrap();
    assert_eq!(binding.state(), ("count", &Slot::Set(json!(0))));

    binding.on_change("count", json!(5)).unwrap();
    assert_eq!(store.get_state("count").unwrap(), json!(5));
}

#[test]
fn accepted_change_notifies_everyone_once() {
    init_logging();
    let store = Store::builder()
        .defaults(json!({ "title": "draft" }))
        .runtime(Runtime::new())
        .build()
        .unwrap();

    let binding = store.subscribe("title").unwrap();
    let (listener_calls, listener) = counter();
    binding.on(&binding.channel(), listener).unwrap();

    let (reducer_calls, subscriber) = counter();
    let _sub = store.reducer("title").unwrap().subscribe(subscriber);

    store.on_change("title", json!("final")).unwrap();

    assert_eq!(store.get_state("title").unwrap(), json!("final"));
    assert_eq!(listener_calls.load(Ordering::SeqCst), 1);
    assert_eq!(reducer_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn rejected_change_is_invisible() {
    init_logging();
    let store = Store::builder()
        .defaults(json!({ "email": "a@b.c" }))
        .validator(|key, value| key != "email" || value.as_str().is_some_and(|s| s.contains('@')))
        .runtime(Runtime::new())
        .build()
        .unwrap();

    let binding = store.subscribe("email").unwrap();
    let (listener_calls, listener) = counter();
    binding.on(&binding.channel(), listener).unwrap();
    let (reducer_calls, subscriber) = counter();
    let _sub = store.reducer("email").unwrap().subscribe(subscriber);

    assert!(!store.on_change("email", json!("nope")).unwrap());

    assert_eq!(store.get_state("email").unwrap(), json!("a@b.c"));
    assert_eq!(listener_calls.load(Ordering::SeqCst), 0);
    assert_eq!(reducer_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn listener_writes_another_key() {
    init_logging();
    let store = Store::builder()
        .defaults(json!({ "a": 0, "b": 0 }))
        .runtime(Runtime::new())
        .build()
        .unwrap();

    let a = store.subscribe("a").unwrap();
    let store_clone = store.clone();
    a.on(&a.channel(), move |v| {
        let doubled = v.as_i64().unwrap_or(0) * 2 + 1;
        store_clone.on_change("b", json!(doubled)).unwrap();
    })
    .unwrap();

    let b = store.subscribe("b").unwrap();
    let (b_calls, b_listener) = counter();
    b.on(&b.channel(), b_listener).unwrap();

    store.on_change("a", json!(3)).unwrap();

    assert_eq!(store.get_state("a").unwrap(), json!(3));
    assert_eq!(store.get_state("b").unwrap(), json!(7));
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn validator_reads_the_store() {
    init_logging();
    // `max` must stay at or above `min`
    let cell: Arc<OnceLock<Store>> = Arc::new(OnceLock::new());
    let cell_clone = cell.clone();
    let store = Store::builder()
        .defaults(json!({ "min": 5, "max": 10 }))
        .validator(move |key, value| {
            let Some(store) = cell_clone.get() else {
                return true;
            };
            if key != "max" {
                return true;
            }
            let min = store
                .get_state("min")
                .ok()
                .and_then(|slot| slot.as_value().and_then(Value::as_i64))
                .unwrap_or(0);
            value.as_i64().is_some_and(|max| max >= min)
        })
        .runtime(Runtime::new())
        .build()
        .unwrap();
    assert!(cell.set(store.clone()).is_ok());

    assert!(!store.on_change("max", json!(4)).unwrap());
    assert_eq!(store.get_state("max").unwrap(), json!(10));

    assert!(store.on_change("min", json!(2)).unwrap());
    assert!(store.on_change("max", json!(4)).unwrap());
    assert_eq!(store.get_state("max").unwrap(), json!(4));
}

#[test]
fn persistent_listener_writes_back() {
    let backend = MemoryBackend::new();
    let store = Store::builder()
        .id("echo")
        .defaults(json!({ "input": "", "length": 0 }))
        .backend(backend.clone())
        .runtime(Runtime::new())
        .build()
        .unwrap();

    let input = store.subscribe("input").unwrap();
    let store_clone = store.clone();
    input
        .on(&input.channel(), move |v| {
            let len = v.as_str().map_or(0, str::len);
            store_clone.on_change("length", json!(len)).unwrap();
        })
        .unwrap();

    store.on_change("input", json!("hello")).unwrap();

    let blob = backend.read("echo").unwrap().unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(&blob).unwrap(),
        json!({ "input": "hello", "length": 5 })
    );
}

#[test]
fn with_validator_constructor() {
    let store = Store::with_validator(json!({ "n": 1 }), |_, v| v.is_number()).unwrap();
    assert!(!store.on_change("n", json!("one")).unwrap());
    assert!(store.on_change("n", json!(2)).unwrap());
    assert_eq!(store.get_state("n").unwrap(), json!(2));
}

#[test]
fn validator_shared_between_stores() {
    let positive: Validator = Arc::new(|_: &str, v: &Value| v.as_i64().is_some_and(|n| n > 0));
    let runtime = Runtime::new();
    let stores: Vec<Store> = (0..2)
        .map(|_| {
            let positive = positive.clone();
            Store::builder()
                .defaults(json!({ "n": 1 }))
                .validator(move |key, value| positive(key, value))
                .runtime(runtime.clone())
                .build()
                .unwrap()
        })
        .collect();

    for store in &stores {
        assert!(!store.on_change("n", json!(-1)).unwrap());
        assert!(store.on_change("n", json!(2)).unwrap());
    }
    assert_eq!(Arc::strong_count(&positive), 3);
}

#[test]
fn reducer_dispatch_flow() {
    init_logging();
    Runtime::scope(|| {
        let store = Store::new(json!({ "todos": [] })).unwrap();
        let todos = store.reducer("todos").unwrap();

        assert!(matches!(
            todos.dispatch(json!({ "type": "add", "text": "milk" })),
            Err(Error::NoReducerConfigured(_))
        ));
        assert_eq!(store.get_state("todos").unwrap(), json!([]));

        todos.set(|current, action| {
            let mut items = current
                .as_value()
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            match action["type"].as_str() {
                Some("add") => items.push(action["text"].clone()),
                Some("clear") => items.clear(),
                _ => return Err("unknown action".into()),
            }
            Ok(Value::Array(items))
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sub = todos.subscribe(move |v| seen_clone.lock().unwrap().push(v.clone()));

        todos.dispatch(json!({ "type": "add", "text": "milk" })).unwrap();
        todos.dispatch(json!({ "type": "add", "text": "eggs" })).unwrap();
        assert_eq!(store.get_state("todos").unwrap(), json!(["milk", "eggs"]));

        let err = todos.dispatch(json!({ "type": "explode" })).unwrap_err();
        assert_eq!(err.to_string(), "reducer function error: unknown action");

        sub.unsubscribe();
        todos.dispatch(json!({ "type": "clear" })).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![json!(["milk"]), json!(["milk", "eggs"])]
        );
        assert_eq!(store.get_state("todos").unwrap(), json!([]));
    });
}

#[test]
fn per_store_reducers_are_independent() {
    let runtime = Runtime::new();
    let first = Store::builder()
        .defaults(json!({ "x": 1 }))
        .runtime(runtime.clone())
        .build()
        .unwrap();
    let second = Store::builder()
        .defaults(json!({ "x": 100 }))
        .runtime(runtime)
        .build()
        .unwrap();

    first.reducer("x").unwrap().set(|_, _| Ok(json!("first")));
    second.reducer("x").unwrap().set(|_, _| Ok(json!("second")));

    first.reducer("x").unwrap().dispatch(json!(null)).unwrap();
    assert_eq!(first.get_state("x").unwrap(), json!("first"));
    assert_eq!(second.get_state("x").unwrap(), json!(100));
}

#[test]
fn shared_scope_reducer_is_overwritten() {
    let runtime = Runtime::new();
    let build = |defaults: Value| {
        Store::builder()
            .defaults(defaults)
            .reducer_scope(ReducerScope::Shared)
            .runtime(runtime.clone())
            .build()
            .unwrap()
    };
    let first = build(json!({ "x": 1 }));
    let second = build(json!({ "x": 100 }));

    first.reducer("x").unwrap().set(|_, _| Ok(json!("first")));
    second.reducer("x").unwrap().set(|_, _| Ok(json!("second")));

    // The second `set` replaced the reducer both stores share
    first.reducer("x").unwrap().dispatch(json!(null)).unwrap();
    assert_eq!(first.get_state("x").unwrap(), json!("second"));

    // Subscribers are shared too: a write in either store reaches them
    let (calls, subscriber) = counter();
    let _sub = first.reducer("x").unwrap().subscribe(subscriber);
    second.on_change("x", json!(5)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn persistent_round_trip_memory() {
    init_logging();
    let backend = MemoryBackend::new();

    let store = Store::persistent("S", json!({ "k": "default" }), backend.clone()).unwrap();
    assert!(store.is_persistent());
    store.on_change("k", json!({ "nested": [1, 2, 3] })).unwrap();

    let fresh = Store::persistent("S", json!({ "k": "other", "extra": 1 }), backend).unwrap();
    assert_eq!(fresh.get_state("k").unwrap(), json!({ "nested": [1, 2, 3] }));
    assert_eq!(fresh.get_state("extra").unwrap(), json!(1));
}

#[test]
fn persistent_round_trip_files() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();

    let store = Store::persistent("settings", json!({ "volume": 3 }), FileBackend::new(dir.path()))
        .unwrap();
    store.on_change("volume", json!(11)).unwrap();
    drop(store);

    let fresh = Store::persistent("settings", json!({ "volume": 0 }), FileBackend::new(dir.path()))
        .unwrap();
    assert_eq!(fresh.get_state("volume").unwrap(), json!(11));
}

#[test]
fn corrupt_snapshot_keeps_defaults() {
    init_logging();
    let backend = MemoryBackend::new();
    backend.write("S", "{ this is not json").unwrap();

    let store = Store::persistent("S", json!({ "k": 1 }), backend.clone()).unwrap();
    assert_eq!(store.get_state("k").unwrap(), json!(1));

    // The next accepted change replaces the corrupt blob
    store.on_change("k", json!(2)).unwrap();
    let blob = backend.read("S").unwrap().unwrap();
    assert_eq!(serde_json::from_str::<Value>(&blob).unwrap(), json!({ "k": 2 }));
}

#[test]
fn absent_keys_are_not_persisted() {
    let backend = MemoryBackend::new();
    let store = Store::persistent("S", json!({}), backend.clone()).unwrap();
    store.subscribe("pending").unwrap();
    store.on_change("done", json!(true)).unwrap();

    let blob = backend.read("S").unwrap().unwrap();
    assert_eq!(serde_json::from_str::<Value>(&blob).unwrap(), json!({ "done": true }));
    assert_eq!(store.get_state("pending").unwrap(), Slot::Absent);
}

#[test]
fn get_states_is_live() {
    let store = Store::new(json!({ "a": 1 })).unwrap();
    let states = store.get_states();
    store.on_change("b", json!(2)).unwrap();
    assert_eq!(states.to_json(), json!({ "a": 1, "b": 2 }));
    assert_eq!(states.read(|map| map.len()), 2);
}

#[test]
fn off_without_id_removes_all_listeners() {
    let store = Store::builder().runtime(Runtime::new()).build().unwrap();
    let binding = store.subscribe("k").unwrap();
    let (calls, first) = counter();
    let calls_clone = calls.clone();
    binding.on(&binding.channel(), first).unwrap();
    binding
        .on(&binding.channel(), move |_| {
            calls_clone.fetch_add(10, Ordering::SeqCst);
        })
        .unwrap();

    store.on_change("k", json!(1)).unwrap();
    binding.off(&binding.channel(), None).unwrap();
    store.on_change("k", json!(2)).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 11);
    assert_eq!(store.runtime().notifications().listener_count(&binding.channel()), 0);
}

#[test]
#[should_panic(expected = "listener failed")]
fn panicking_listener_propagates() {
    let store = Store::builder().runtime(Runtime::new()).build().unwrap();
    let binding = store.subscribe("k").unwrap();
    binding
        .on(&binding.channel(), |_| panic!("listener failed"))
        .unwrap();
    let _ = store.on_change("k", json!(1));
}
