//! Generic repository contract.
//!
//! [`Repository`] is the full set of data-access operations for one entity
//! type. Callers depend on the trait; each store technology provides its
//! own implementation.

use async_trait::async_trait;
use bson::{oid::ObjectId, Document};

use common::{Paginated, ResponseData};
use domain::DomainResult;

/// Query filter in MongoDB syntax. An empty document matches everything.
pub type Filter = Document;

/// Input for batch-capable writes.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<T> for OneOrMany<T> {
    fn from(item: T) -> Self {
        OneOrMany::One(item)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

/// Data-access operations for entity type `T`.
///
/// Store failures surface as `Database Error`; absent identifiers surface as
/// `Not Found`. A missing entity is never returned as an empty success.
///
/// Batch `create`/`update` issue every sub-write before awaiting any and
/// fail if one of them fails. They are not atomic: sub-writes that succeeded
/// are kept.
#[async_trait]
pub trait Repository<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Insert one entity or a non-empty batch; returns the first created item
    async fn create(&self, data: OneOrMany<T>) -> DomainResult<ResponseData<T>>;

    /// Update one entity or a batch by identifier; returns the first updated item
    async fn update(&self, data: OneOrMany<T>) -> DomainResult<ResponseData<T>>;

    /// Remove by identifier; returns the removed entity
    async fn delete(&self, id: ObjectId) -> DomainResult<ResponseData<T>>;

    /// Find by identifier
    async fn find(&self, id: ObjectId) -> DomainResult<ResponseData<T>>;

    /// All entities, unbounded
    async fn find_all(&self) -> DomainResult<ResponseData<Vec<T>>>;

    /// One page of all entities; `page` and `limit` start at 1
    async fn find_all_paginated(&self, page: u64, limit: u64) -> DomainResult<Paginated<T>>;

    /// Total number of entities
    async fn count(&self) -> DomainResult<u64>;

    /// Entities matching `filter`
    async fn search(&self, filter: Filter) -> DomainResult<ResponseData<Vec<T>>>;

    /// One page of entities matching `filter`
    async fn search_paginated(&self, filter: Filter, page: u64, limit: u64) -> DomainResult<Paginated<T>>;

    /// Whether an entity with this identifier exists
    async fn exists(&self, id: ObjectId) -> DomainResult<bool>;
}
