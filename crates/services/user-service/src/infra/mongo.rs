//! MongoDB adapter for [`DocumentCollection`].

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures::TryStreamExt;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, IndexModel};
use once_cell::sync::Lazy;
use regex::Regex;

use super::store::{DocumentCollection, StoreError, StoreResult};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

static DUP_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"index: (?P<index>\S+) dup key: (?P<value>.*)").expect("valid duplicate key pattern")
});

/// A live MongoDB collection of raw documents.
#[derive(Clone, Debug)]
pub struct MongoCollection {
    inner: Collection<Document>,
}

impl MongoCollection {
    pub fn new(inner: Collection<Document>) -> Self {
        Self { inner }
    }

    /// Create ascending unique indexes on the given fields.
    pub async fn ensure_unique(&self, fields: &[&str]) -> StoreResult<()> {
        let models = fields
            .iter()
            .map(|field| {
                let mut keys = Document::new();
                keys.insert(*field, 1);
                IndexModel::builder()
                    .keys(keys)
                    .options(IndexOptions::builder().unique(true).build())
                    .build()
            })
            .collect::<Vec<_>>();

        self.inner.create_indexes(models).await.map_err(classify)?;
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Map driver errors, singling out unique index violations.
fn classify(err: MongoError) -> StoreError {
    if !is_duplicate_key(&err) {
        return StoreError::Driver(err);
    }

    let message = err.to_string();
    match DUP_KEY_RE.captures(&message) {
        Some(caps) => StoreError::DuplicateKey {
            field: caps["index"].trim_end_matches("_1").to_string(),
            value: caps["value"].to_string(),
        },
        None => StoreError::DuplicateKey {
            field: "unknown".to_string(),
            value: message,
        },
    }
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    async fn insert_one(&self, document: Document) -> StoreResult<ObjectId> {
        let result = self.inner.insert_one(document).await.map_err(classify)?;
        match result.inserted_id {
            Bson::ObjectId(id) => Ok(id),
            other => Err(StoreError::Malformed(format!("non ObjectId _id: {}", other))),
        }
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>> {
        self.inner
            .find_one(doc! { "_id": id })
            .await
            .map_err(classify)
    }

    async fn update_by_id(&self, id: ObjectId, update: Document) -> StoreResult<Option<Document>> {
        self.inner
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(classify)
    }

    async fn delete_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>> {
        self.inner
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(classify)
    }

    async fn find(&self, filter: Document, skip: u64, limit: Option<u64>) -> StoreResult<Vec<Document>> {
        let mut query = self.inner.find(filter).sort(doc! { "_id": 1 }).skip(skip);
        if let Some(limit) = limit {
            query = query.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let cursor = query.await.map_err(classify)?;
        cursor.try_collect().await.map_err(classify)
    }

    async fn count(&self, filter: Document) -> StoreResult<u64> {
        self.inner.count_documents(filter).await.map_err(classify)
    }
}
