use crate::core::OperationKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Document '{1}' not found in collection '{0}'")]
    NotFound(String, String),

    #[error("Store is closed")]
    Closed,

    #[error("Simulated failure injected for {0} operation")]
    SimulatedFailure(OperationKind),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_, _))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::SimulatedFailure(_))
    }
}
