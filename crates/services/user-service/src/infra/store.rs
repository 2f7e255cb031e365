//! Document store contract.
//!
//! The repository talks to the store only through [`DocumentCollection`].
//! Implementations guarantee atomic single-document writes and enforce the
//! collection's unique indexes; a violated index is reported as
//! [`StoreError::DuplicateKey`], never as a silent overwrite.

use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use thiserror::Error;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Store-level failures, reclassified by the repository.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key for {field}: {value}")]
    DuplicateKey { field: String, value: String },

    #[error("unsupported query operator {0}")]
    UnsupportedOperator(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(err: bson::de::Error) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A single collection of BSON documents keyed by `_id`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Insert a document, assigning `_id` when absent. Returns the id.
    async fn insert_one(&self, document: Document) -> StoreResult<ObjectId>;

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>>;

    /// Apply a `$set`-style update and return the updated document.
    async fn update_by_id(&self, id: ObjectId, update: Document) -> StoreResult<Option<Document>>;

    /// Remove a document and return it as it was before removal.
    async fn delete_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>>;

    /// Matching documents in ascending `_id` order.
    async fn find(&self, filter: Document, skip: u64, limit: Option<u64>) -> StoreResult<Vec<Document>>;

    async fn count(&self, filter: Document) -> StoreResult<u64>;
}
