mod config;
mod store;

pub use config::StoreConfig;
pub use store::{CollectionSubscription, DocumentSubscription, InMemoryDocumentStore};
