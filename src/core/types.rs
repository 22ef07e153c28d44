use super::{Result, StoreError, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies exactly one document: a (collection, document id) pair.
///
/// Equality is by value; both parts must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentKey {
    collection: String,
    doc_id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, doc_id: impl Into<String>) -> Result<Self> {
        let collection = collection.into();
        let doc_id = doc_id.into();

        if collection.is_empty() {
            return Err(StoreError::InvalidArgument(
                "collection name cannot be empty".into(),
            ));
        }
        if doc_id.is_empty() {
            return Err(StoreError::InvalidArgument(
                "document id cannot be empty".into(),
            ));
        }

        Ok(Self { collection, doc_id })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.doc_id)
    }
}

/// Kind of store operation, consumed by the fault injector and carried
/// in classified error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Save,
    Delete,
    Read,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Save => write!(f, "save"),
            Self::Delete => write!(f, "delete"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// One document inside a collection snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub doc_id: String,
    pub data: Value,
}

impl DocumentSnapshot {
    pub fn new(doc_id: impl Into<String>, data: Value) -> Self {
        Self {
            doc_id: doc_id.into(),
            data,
        }
    }
}
