mod error;
mod types;
mod value;

pub use error::{Result, StoreError};
pub use types::{DocumentKey, DocumentSnapshot, OperationKind};
pub use value::Value;
