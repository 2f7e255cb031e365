//! Infrastructure layer - document store adapters and connection lifecycle.

mod db;
mod memory;
mod mongo;
mod store;

pub use db::{Database, USER_UNIQUE_FIELDS};
pub use memory::MemoryCollection;
pub use mongo::MongoCollection;
pub use store::{DocumentCollection, StoreError, StoreResult};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockDocumentCollection;
