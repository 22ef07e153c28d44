use crate::core::{Result, Value};
use crate::store::InMemoryDocumentStore;
use async_trait::async_trait;

/// A generic trait for keyed document backends.
///
/// Upstream gateway/repository layers can be written against this seam,
/// using [`InMemoryDocumentStore`] in tests and a real remote client in
/// production.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Replace the full value stored under the key; returns the stored
    /// snapshot.
    async fn write(&self, collection: &str, doc_id: &str, value: Value) -> Result<Value>;

    /// Read the current value under the key.
    async fn read(&self, collection: &str, doc_id: &str) -> Result<Value>;

    /// Delete the value under the key; succeeds even if absent.
    async fn delete(&self, collection: &str, doc_id: &str) -> Result<()>;
}

#[async_trait]
impl DocumentBackend for InMemoryDocumentStore {
    async fn write(&self, collection: &str, doc_id: &str, value: Value) -> Result<Value> {
        InMemoryDocumentStore::write(self, collection, doc_id, value).await
    }

    async fn read(&self, collection: &str, doc_id: &str) -> Result<Value> {
        InMemoryDocumentStore::read(self, collection, doc_id).await
    }

    async fn delete(&self, collection: &str, doc_id: &str) -> Result<()> {
        InMemoryDocumentStore::delete(self, collection, doc_id).await
    }
}
