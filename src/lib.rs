//! In-memory reactive keyed document store with per-key FIFO execution,
//! used as a deterministic test double for a remote document database.
//!
//! - [`InMemoryDocumentStore`] holds authoritative keyed state and
//!   exposes CRUD-plus-observe operations.
//! - [`KeyedFifoExecutor`] serializes mutations sharing a key while
//!   letting distinct keys run concurrently.
//! - [`Subscription`]s deliver a seed snapshot at subscribe time, then
//!   one event per distinct mutation, in mutation order.
//! - [`StoreConfig`] injects deterministic faults and latency.
//! - [`ErrorClassifier`] maps raised faults into a closed taxonomy for
//!   upstream gateway layers.
//!
//! # Examples
//!
//! ```
//! use memdocdb::{InMemoryDocumentStore, StoreConfig, Value};
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryDocumentStore::new(StoreConfig::default());
//!
//! let mut observer = store.observe_document("users", "u1").await.unwrap();
//! assert_eq!(observer.next().await, Some(Value::Null)); // seed: absent
//!
//! store
//!     .write("users", "u1", Value::map([("name", Value::from("Alice"))]))
//!     .await
//!     .unwrap();
//! let event = observer.next().await.unwrap();
//! assert_eq!(event.get("name").and_then(Value::as_str), Some("Alice"));
//!
//! store.shutdown();
//! # });
//! ```

pub mod classify;
pub mod core;
pub mod executor;
pub mod fault;
pub mod interface;
pub mod notify;
pub mod store;

// Re-export main types for convenience
pub use classify::{ClassifiedError, ErrorClassifier, FaultKind, OperationContext};
pub use self::core::{DocumentKey, DocumentSnapshot, OperationKind, Result, StoreError, Value};
pub use executor::KeyedFifoExecutor;
pub use interface::DocumentBackend;
pub use notify::Subscription;
pub use store::{
    CollectionSubscription, DocumentSubscription, InMemoryDocumentStore, StoreConfig,
};
