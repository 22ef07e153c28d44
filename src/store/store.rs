use super::StoreConfig;
use crate::core::{DocumentKey, DocumentSnapshot, OperationKind, Result, StoreError, Value};
use crate::executor::KeyedFifoExecutor;
use crate::fault::FaultInjector;
use crate::notify::{Subscription, TopicHub};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Subscription to one document; events are the document's value, with
/// `Value::Null` standing in for an absent document.
pub type DocumentSubscription = Subscription<DocumentKey, Value>;

/// Subscription to a whole collection; events are the full snapshot of
/// the collection's documents.
pub type CollectionSubscription = Subscription<String, Vec<DocumentSnapshot>>;

/// In-memory reactive keyed document store.
///
/// Holds authoritative state for keyed documents, serializes mutations
/// per (collection, document id) through a [`KeyedFifoExecutor`], fans
/// out seed + delta snapshots to observers, and simulates failure and
/// latency declaratively. Intended as a test double for a remote
/// document database: no network, no disk, deterministic behavior.
///
/// The store is an owned instance with a construct → operate →
/// [`shutdown`](Self::shutdown) lifecycle; pass it (or a clone, which
/// shares state) explicitly to collaborators.
///
/// ```
/// use memdocdb::{InMemoryDocumentStore, StoreConfig, Value};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryDocumentStore::new(StoreConfig::default());
///
/// store
///     .write("users", "u1", Value::map([("name", Value::from("Alice"))]))
///     .await
///     .unwrap();
///
/// let doc = store.read("users", "u1").await.unwrap();
/// assert_eq!(doc.get("name").and_then(Value::as_str), Some("Alice"));
/// # });
/// ```
pub struct InMemoryDocumentStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: StoreConfig,
    /// Collection name → (document id → value). The inner map keeps
    /// insertion order; sorting happens at snapshot time.
    state: RwLock<HashMap<String, IndexMap<String, Value>>>,
    executor: KeyedFifoExecutor<DocumentKey>,
    documents: TopicHub<DocumentKey, Value>,
    collections: TopicHub<String, Vec<DocumentSnapshot>>,
    injector: FaultInjector,
    closed: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new(config: StoreConfig) -> Self {
        let injector = FaultInjector::new(
            config.latency,
            config.fail_on_save,
            config.fail_on_delete,
            config.fail_on_read,
            config.fail_once.clone(),
        );

        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(HashMap::new()),
                executor: KeyedFifoExecutor::new(),
                documents: TopicHub::new(config.channel_capacity),
                collections: TopicHub::new(config.channel_capacity),
                injector,
                closed: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// Replaces the whole value stored under `collection`/`doc_id` and
    /// returns the stored snapshot.
    ///
    /// Validation failures are raised synchronously, before the write
    /// enters its key's queue. Observers of the document and of the
    /// owning collection are notified when the new content differs from
    /// the previous one.
    pub async fn write(&self, collection: &str, doc_id: &str, value: Value) -> Result<Value> {
        self.ensure_open()?;
        let key = DocumentKey::new(collection, doc_id)?;

        let inner = Arc::clone(&self.inner);
        self.inner
            .executor
            .submit(key.clone(), async move {
                inner.injector.inject(OperationKind::Save).await?;

                let mut state = inner.state.write().await;
                let stored = if inner.config.deep_copy {
                    value.deep_copy()
                } else {
                    value
                };

                let entries = state.entry(key.collection().to_string()).or_default();
                let changed = entries.get(key.doc_id()) != Some(&stored);
                entries.insert(key.doc_id().to_string(), stored.clone());

                if changed || !inner.config.dedupe {
                    let snapshot =
                        collection_snapshot(entries, inner.config.sorted_collections);
                    debug!(key = %key, "document written, notifying observers");
                    inner.documents.publish(&key, stored.clone());
                    inner
                        .collections
                        .publish(&key.collection().to_string(), snapshot);
                }

                Ok(stored)
            })
            .await
    }

    /// Reads the current value under `collection`/`doc_id`.
    ///
    /// Fails with `NotFound` if the document has never been written or
    /// was deleted. The returned snapshot is structurally independent of
    /// stored state.
    pub async fn read(&self, collection: &str, doc_id: &str) -> Result<Value> {
        self.ensure_open()?;
        let key = DocumentKey::new(collection, doc_id)?;

        self.inner.injector.inject(OperationKind::Read).await?;

        let state = self.inner.state.read().await;
        state
            .get(key.collection())
            .and_then(|entries| entries.get(key.doc_id()))
            .map(|value| self.boundary_copy(value))
            .ok_or_else(|| {
                StoreError::NotFound(key.collection().to_string(), key.doc_id().to_string())
            })
    }

    /// Deletes the document under `collection`/`doc_id`.
    ///
    /// Idempotent: deleting an absent document succeeds. On an actual
    /// removal, document observers receive the canonical empty value and
    /// collection observers the shrunken snapshot.
    pub async fn delete(&self, collection: &str, doc_id: &str) -> Result<()> {
        self.ensure_open()?;
        let key = DocumentKey::new(collection, doc_id)?;

        let inner = Arc::clone(&self.inner);
        self.inner
            .executor
            .submit(key.clone(), async move {
                inner.injector.inject(OperationKind::Delete).await?;

                let mut state = inner.state.write().await;
                let removed = state
                    .get_mut(key.collection())
                    .and_then(|entries| entries.shift_remove(key.doc_id()));

                // Emptied collections are released so the state map does
                // not grow with every collection name ever touched.
                if state
                    .get(key.collection())
                    .is_some_and(|entries| entries.is_empty())
                {
                    state.remove(key.collection());
                }

                if removed.is_some() || !inner.config.dedupe {
                    let snapshot = state
                        .get(key.collection())
                        .map(|entries| {
                            collection_snapshot(entries, inner.config.sorted_collections)
                        })
                        .unwrap_or_default();
                    debug!(key = %key, "document deleted, notifying observers");
                    inner.documents.publish(&key, Value::Null);
                    inner
                        .collections
                        .publish(&key.collection().to_string(), snapshot);
                }

                Ok(())
            })
            .await
    }

    /// Observes one document. The subscription immediately yields a seed
    /// (current value, or `Value::Null` when absent), then one event per
    /// subsequent distinct mutation until cancelled.
    ///
    /// Delivery is buffered per key ([`StoreConfig::channel_capacity`]
    /// events); a subscriber that falls further behind skips ahead to
    /// the oldest retained snapshot instead of failing.
    pub async fn observe_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<DocumentSubscription> {
        self.ensure_open()?;
        let key = DocumentKey::new(collection, doc_id)?;

        // Holding the read lock pins the seed: no mutation can publish
        // between the seed capture and the receiver registration.
        let state = self.inner.state.read().await;
        let seed = state
            .get(key.collection())
            .and_then(|entries| entries.get(key.doc_id()))
            .map(|value| self.boundary_copy(value))
            .unwrap_or(Value::Null);

        Ok(self
            .inner
            .documents
            .subscribe(key, seed, self.inner.config.dedupe))
    }

    /// Observes a whole collection with the same seed + delta + dedupe
    /// contract; events carry the full snapshot of the collection.
    ///
    /// Observing a collection nothing was ever written to succeeds; the
    /// seed is an empty snapshot. Delivery is buffered the same way as
    /// for document observers.
    pub async fn observe_collection(&self, collection: &str) -> Result<CollectionSubscription> {
        self.ensure_open()?;
        if collection.is_empty() {
            return Err(StoreError::InvalidArgument(
                "collection name cannot be empty".into(),
            ));
        }

        let state = self.inner.state.read().await;
        let seed = state
            .get(collection)
            .map(|entries| collection_snapshot(entries, self.inner.config.sorted_collections))
            .unwrap_or_default();

        Ok(self
            .inner
            .collections
            .subscribe(collection.to_string(), seed, self.inner.config.dedupe))
    }

    /// Tears the store down: closes every live subscription, discards
    /// queued mutations that have not started, and makes every
    /// subsequent operation fail with `Closed`. Idempotent; in-flight
    /// mutations are allowed to finish.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.executor.dispose();
        self.inner.documents.close();
        self.inner.collections.close();
        debug!("document store shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn boundary_copy(&self, value: &Value) -> Value {
        if self.inner.config.deep_copy {
            value.deep_copy()
        } else {
            value.clone()
        }
    }
}

impl Clone for InMemoryDocumentStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn collection_snapshot(entries: &IndexMap<String, Value>, sorted: bool) -> Vec<DocumentSnapshot> {
    let mut docs: Vec<DocumentSnapshot> = entries
        .iter()
        .map(|(doc_id, value)| DocumentSnapshot::new(doc_id.clone(), value.clone()))
        .collect();
    if sorted {
        docs.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
    }
    docs
}
