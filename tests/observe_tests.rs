/// Observation tests
///
/// Seed + delta delivery, dedupe-by-content, collection ordering and
/// subscriber independence.
/// Run with: cargo test --test observe_tests
use memdocdb::{
    CollectionSubscription, DocumentSubscription, InMemoryDocumentStore, StoreConfig, Value,
};
use std::time::Duration;

fn store() -> InMemoryDocumentStore {
    InMemoryDocumentStore::new(StoreConfig::default())
}

async fn next_doc(sub: &mut DocumentSubscription) -> Value {
    tokio::time::timeout(Duration::from_secs(1), sub.next())
        .await
        .expect("timed out waiting for document event")
        .expect("subscription ended unexpectedly")
}

async fn next_coll(sub: &mut CollectionSubscription) -> Vec<String> {
    tokio::time::timeout(Duration::from_secs(1), sub.next())
        .await
        .expect("timed out waiting for collection event")
        .expect("subscription ended unexpectedly")
        .into_iter()
        .map(|doc| doc.doc_id)
        .collect()
}

#[tokio::test]
async fn test_seed_then_one_event_per_distinct_mutation() {
    let store = store();

    let mut observer = store.observe_document("users", "u1").await.unwrap();

    store
        .write("users", "u1", Value::map([("name", Value::from("Alice"))]))
        .await
        .unwrap();
    store
        .write(
            "users",
            "u1",
            Value::map([("name", Value::from("Alice")), ("age", Value::from(31))]),
        )
        .await
        .unwrap();

    // Exactly 3 events: canonical empty seed, then the two writes.
    assert_eq!(next_doc(&mut observer).await, Value::Null);
    assert_eq!(
        next_doc(&mut observer).await,
        Value::map([("name", Value::from("Alice"))])
    );
    assert_eq!(
        next_doc(&mut observer).await,
        Value::map([("name", Value::from("Alice")), ("age", Value::from(31))])
    );
}

#[tokio::test]
async fn test_identical_consecutive_writes_dedupe() {
    let store = store();

    let mut observer = store.observe_document("users", "u1").await.unwrap();
    assert_eq!(next_doc(&mut observer).await, Value::Null);

    let doc = Value::map([("name", Value::from("Alice"))]);
    store.write("users", "u1", doc.clone()).await.unwrap();
    store.write("users", "u1", doc.clone()).await.unwrap();
    store
        .write("users", "u1", Value::map([("name", Value::from("Bob"))]))
        .await
        .unwrap();

    // The structurally identical second write produces no event; the
    // next thing the observer sees after Alice is Bob.
    assert_eq!(next_doc(&mut observer).await, doc);
    assert_eq!(
        next_doc(&mut observer).await,
        Value::map([("name", Value::from("Bob"))])
    );
}

#[tokio::test]
async fn test_dedupe_disabled_delivers_every_write() {
    let store = InMemoryDocumentStore::new(StoreConfig::new().dedupe(false));

    let mut observer = store.observe_document("users", "u1").await.unwrap();
    assert_eq!(next_doc(&mut observer).await, Value::Null);

    let doc = Value::map([("name", Value::from("Alice"))]);
    store.write("users", "u1", doc.clone()).await.unwrap();
    store.write("users", "u1", doc.clone()).await.unwrap();

    assert_eq!(next_doc(&mut observer).await, doc);
    assert_eq!(next_doc(&mut observer).await, doc);
}

#[tokio::test]
async fn test_collection_snapshots_sorted_by_doc_id() {
    let store = store();

    let mut observer = store.observe_collection("letters").await.unwrap();
    assert_eq!(next_coll(&mut observer).await, Vec::<String>::new());

    for id in ["b", "a", "c"] {
        store
            .write("letters", id, Value::map([("id", Value::from(id))]))
            .await
            .unwrap();
    }

    assert_eq!(next_coll(&mut observer).await, vec!["b"]);
    assert_eq!(next_coll(&mut observer).await, vec!["a", "b"]);
    assert_eq!(next_coll(&mut observer).await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_collection_insertion_order_when_sorting_disabled() {
    let store = InMemoryDocumentStore::new(StoreConfig::new().sorted_collections(false));

    for id in ["b", "a", "c"] {
        store
            .write("letters", id, Value::map([("id", Value::from(id))]))
            .await
            .unwrap();
    }

    let mut observer = store.observe_collection("letters").await.unwrap();
    assert_eq!(next_coll(&mut observer).await, vec!["b", "a", "c"]);
}

#[tokio::test]
async fn test_observer_sees_canonical_empty_after_delete() {
    let store = store();

    store
        .write("users", "u1", Value::map([("name", Value::from("Alice"))]))
        .await
        .unwrap();

    let mut observer = store.observe_document("users", "u1").await.unwrap();
    assert_eq!(
        next_doc(&mut observer).await,
        Value::map([("name", Value::from("Alice"))])
    );

    store.delete("users", "u1").await.unwrap();
    assert_eq!(next_doc(&mut observer).await, Value::Null);
}

#[tokio::test]
async fn test_collection_observer_sees_removal() {
    let store = store();

    store.write("users", "u1", Value::from(1)).await.unwrap();
    store.write("users", "u2", Value::from(2)).await.unwrap();

    let mut observer = store.observe_collection("users").await.unwrap();
    assert_eq!(next_coll(&mut observer).await, vec!["u1", "u2"]);

    store.delete("users", "u1").await.unwrap();
    assert_eq!(next_coll(&mut observer).await, vec!["u2"]);
}

#[tokio::test]
async fn test_cancelling_one_subscription_leaves_others_live() {
    let store = store();

    let first = store.observe_document("users", "u1").await.unwrap();
    let mut second = store.observe_document("users", "u1").await.unwrap();

    first.cancel();

    assert_eq!(next_doc(&mut second).await, Value::Null);
    store.write("users", "u1", Value::from(42)).await.unwrap();
    assert_eq!(next_doc(&mut second).await, Value::from(42));
}

#[tokio::test]
async fn test_unknown_collection_observation_succeeds() {
    let store = store();

    let mut doc_observer = store.observe_document("nowhere", "ghost").await.unwrap();
    assert_eq!(next_doc(&mut doc_observer).await, Value::Null);

    let mut coll_observer = store.observe_collection("nowhere").await.unwrap();
    assert_eq!(next_coll(&mut coll_observer).await, Vec::<String>::new());
}

#[tokio::test]
async fn test_small_channel_capacity_skips_but_keeps_stream_alive() {
    let store = InMemoryDocumentStore::new(StoreConfig::new().channel_capacity(2));

    let mut observer = store.observe_document("counters", "c1").await.unwrap();
    assert_eq!(next_doc(&mut observer).await, Value::Null);

    for i in 1..=10 {
        store.write("counters", "c1", Value::from(i)).await.unwrap();
    }

    // Only the last `channel_capacity` events are retained; the
    // observer resumes at the oldest of those and stays subscribed.
    assert_eq!(next_doc(&mut observer).await, Value::from(9));
    assert_eq!(next_doc(&mut observer).await, Value::from(10));

    store.write("counters", "c1", Value::from(11)).await.unwrap();
    assert_eq!(next_doc(&mut observer).await, Value::from(11));
}

#[tokio::test]
async fn test_independent_observers_both_receive_events() {
    let store = store();

    let mut doc_observer = store.observe_document("users", "u1").await.unwrap();
    let mut coll_observer = store.observe_collection("users").await.unwrap();

    store
        .write("users", "u1", Value::map([("name", Value::from("Alice"))]))
        .await
        .unwrap();

    assert_eq!(next_doc(&mut doc_observer).await, Value::Null);
    assert_eq!(
        next_doc(&mut doc_observer).await,
        Value::map([("name", Value::from("Alice"))])
    );

    assert_eq!(next_coll(&mut coll_observer).await, Vec::<String>::new());
    assert_eq!(next_coll(&mut coll_observer).await, vec!["u1"]);
}
