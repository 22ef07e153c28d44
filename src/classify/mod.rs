use crate::core::{OperationKind, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed fault taxonomy surfaced to upstream gateway/repository layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    InvalidArgument,
    NotFound,
    Closed,
    Unexpected,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::NotFound => write!(f, "not_found"),
            Self::Closed => write!(f, "closed"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Where a fault happened: operation kind plus the addressed key parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationContext {
    pub operation: OperationKind,
    pub collection: String,
    pub doc_id: Option<String>,
}

impl OperationContext {
    pub fn new(
        operation: OperationKind,
        collection: impl Into<String>,
        doc_id: Option<String>,
    ) -> Self {
        Self {
            operation,
            collection: collection.into(),
            doc_id,
        }
    }
}

/// A store fault translated into the closed taxonomy, carrying the
/// original description and operation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: FaultKind,
    pub description: String,
    pub context: OperationContext,
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} failed ({}): {}",
            self.context.operation,
            self.context.collection,
            self.context.doc_id.as_deref().unwrap_or("-"),
            self.kind,
            self.description
        )
    }
}

impl std::error::Error for ClassifiedError {}

/// Translates raised store faults into [`FaultKind`]s at the store's
/// boundary. Classification only; no retries, no swallowing.
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(error: &StoreError, context: OperationContext) -> ClassifiedError {
        let kind = match error {
            StoreError::InvalidArgument(_) => FaultKind::InvalidArgument,
            StoreError::NotFound(_, _) => FaultKind::NotFound,
            StoreError::Closed => FaultKind::Closed,
            StoreError::SimulatedFailure(_) | StoreError::Unexpected(_) => FaultKind::Unexpected,
        };

        ClassifiedError {
            kind,
            description: error.to_string(),
            context,
        }
    }
}
