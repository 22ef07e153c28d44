/// Store CRUD tests
///
/// Write/read round trips, snapshot isolation, delete idempotence and
/// input validation.
/// Run with: cargo test --test store_tests
use memdocdb::{DocumentBackend, InMemoryDocumentStore, StoreConfig, Value};

fn store() -> InMemoryDocumentStore {
    InMemoryDocumentStore::new(StoreConfig::default())
}

#[tokio::test]
async fn test_write_read_round_trip() {
    let store = store();

    let doc = Value::map([
        ("name", Value::from("Alice")),
        ("age", Value::from(31)),
        ("tags", Value::list([Value::from("admin"), Value::from("beta")])),
    ]);

    let stored = store.write("users", "u1", doc.clone()).await.unwrap();
    assert_eq!(stored, doc);

    let read_back = store.read("users", "u1").await.unwrap();
    assert_eq!(read_back, doc);
}

#[tokio::test]
async fn test_returned_snapshot_is_isolated() {
    let store = store();

    store
        .write("users", "u1", Value::map([("name", Value::from("Alice"))]))
        .await
        .unwrap();

    let mut snapshot = store.read("users", "u1").await.unwrap();
    if let Value::Map(entries) = &mut snapshot {
        entries.insert("name".to_string(), Value::from("Mallory"));
        entries.insert("admin".to_string(), Value::from(true));
    }

    let read_back = store.read("users", "u1").await.unwrap();
    assert_eq!(
        read_back,
        Value::map([("name", Value::from("Alice"))]),
        "mutating a returned snapshot must not change stored state"
    );
}

#[tokio::test]
async fn test_write_replaces_whole_value() {
    let store = store();

    store
        .write("users", "u1", Value::map([("a", Value::from(1))]))
        .await
        .unwrap();
    store
        .write("users", "u1", Value::map([("b", Value::from(2))]))
        .await
        .unwrap();

    let read_back = store.read("users", "u1").await.unwrap();
    assert!(read_back.get("a").is_none(), "writes are full replacement");
    assert_eq!(read_back.get("b").and_then(Value::as_i64), Some(2));
}

#[tokio::test]
async fn test_read_missing_is_not_found() {
    let store = store();

    let err = store.read("users", "ghost").await.unwrap_err();
    assert!(err.is_not_found());

    // Entirely unknown collection reads the same way.
    let err = store.read("nowhere", "ghost").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let store = store();

    store
        .write("users", "u1", Value::map([("name", Value::from("Alice"))]))
        .await
        .unwrap();

    store.delete("users", "u1").await.unwrap();
    assert!(store.read("users", "u1").await.unwrap_err().is_not_found());

    // Second delete of the same key still succeeds.
    store.delete("users", "u1").await.unwrap();
    assert!(store.read("users", "u1").await.unwrap_err().is_not_found());

    // Deleting from a collection nothing was written to also succeeds.
    store.delete("nowhere", "ghost").await.unwrap();
}

#[tokio::test]
async fn test_empty_key_parts_rejected() {
    let store = store();
    let doc = Value::map([("x", Value::from(1))]);

    assert!(store.write("", "u1", doc.clone()).await.is_err());
    assert!(store.write("users", "", doc).await.is_err());
    assert!(store.read("", "u1").await.is_err());
    assert!(store.delete("users", "").await.is_err());
    assert!(store.observe_document("", "u1").await.is_err());
    assert!(store.observe_collection("").await.is_err());
}

#[tokio::test]
async fn test_write_after_delete_recreates() {
    let store = store();

    store
        .write("users", "u1", Value::map([("v", Value::from(1))]))
        .await
        .unwrap();
    store.delete("users", "u1").await.unwrap();
    store
        .write("users", "u1", Value::map([("v", Value::from(2))]))
        .await
        .unwrap();

    let read_back = store.read("users", "u1").await.unwrap();
    assert_eq!(read_back.get("v").and_then(Value::as_i64), Some(2));
}

#[tokio::test]
async fn test_store_through_backend_trait() {
    let store = store();
    let backend: &dyn DocumentBackend = &store;

    backend
        .write("users", "u1", Value::map([("name", Value::from("Alice"))]))
        .await
        .unwrap();
    let doc = backend.read("users", "u1").await.unwrap();
    assert_eq!(doc.get("name").and_then(Value::as_str), Some("Alice"));

    backend.delete("users", "u1").await.unwrap();
    assert!(backend.read("users", "u1").await.is_err());
}

#[tokio::test]
async fn test_clone_shares_state() {
    let store = store();
    let other = store.clone();

    store
        .write("users", "u1", Value::map([("v", Value::from(1))]))
        .await
        .unwrap();

    let read_back = other.read("users", "u1").await.unwrap();
    assert_eq!(read_back.get("v").and_then(Value::as_i64), Some(1));
}
