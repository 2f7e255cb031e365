//! User repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use futures::future::join_all;

use common::{PaginationParams, Paginated, ResponseData};
use domain::{DomainError, DomainResult, Password, User};

use super::base::{Filter, OneOrMany, Repository};
use super::entities::user::UserDocument;
use crate::infra::{DocumentCollection, StoreError};

/// User-specific lookups on top of the generic contract.
#[async_trait]
pub trait UserRepository: Repository<User> {
    /// Find by email (case-insensitive via normalization)
    async fn find_by_email(&self, email: &str) -> DomainResult<ResponseData<User>>;

    /// Find by username (case-insensitive via normalization)
    async fn find_by_username(&self, username: &str) -> DomainResult<ResponseData<User>>;

    /// Verify credentials; unknown users and wrong passwords both fail with
    /// `Authentication Error`.
    async fn authenticate(&self, username: &str, password: &str) -> DomainResult<ResponseData<User>>;
}

/// Repository bound to one users collection.
pub struct UserStore {
    collection: Arc<dyn DocumentCollection>,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self { collection }
    }

    async fn insert_one(&self, user: User) -> DomainResult<User> {
        let mut document = UserDocument::prepare(user).await?;
        let body = document.insert_body(BsonDateTime::now())?;

        let id = self
            .collection
            .insert_one(body)
            .await
            .map_err(|e| store_error("creating user(s)", e))?;

        document.id = Some(id);
        Ok(User::from(document))
    }

    async fn update_one(&self, user: User) -> DomainResult<User> {
        let id = user
            .id
            .ok_or_else(|| DomainError::invalid_field("id", "User id is required for update."))?;
        let mut document = UserDocument::prepare(user).await?;
        let update = document.update_body(BsonDateTime::now())?;

        let updated = self
            .collection
            .update_by_id(id, update)
            .await
            .map_err(|e| store_error("updating user(s)", e))?
            .ok_or_else(|| DomainError::not_found(format!("User with ID {} not found.", id)))?;

        decode(updated)
    }

    async fn find_one_by(&self, filter: Document, context: &str) -> DomainResult<Option<User>> {
        let mut found = self
            .collection
            .find(filter, 0, Some(1))
            .await
            .map_err(|e| store_error(context, e))?;

        found.pop().map(decode).transpose()
    }

    async fn list(&self, filter: Filter, skip: u64, limit: Option<u64>, context: &str) -> DomainResult<Vec<User>> {
        self.collection
            .find(filter, skip, limit)
            .await
            .map_err(|e| store_error(context, e))?
            .into_iter()
            .map(decode)
            .collect()
    }

    async fn paginate(&self, filter: Filter, page: u64, limit: u64, context: &str) -> DomainResult<Paginated<User>> {
        let params = PaginationParams::new(page, limit)?;

        let total_count = self
            .collection
            .count(filter.clone())
            .await
            .map_err(|e| store_error(context, e))?;
        let users = self
            .list(filter, params.offset(), Some(params.limit), context)
            .await?;

        Ok(Paginated::new(
            users,
            params,
            total_count,
            "Users retrieved successfully with pagination.",
        ))
    }
}

/// Reclassify a store failure as `Database Error`.
#[track_caller]
fn store_error(context: &str, err: StoreError) -> DomainError {
    DomainError::database(format!("Error {}: {}", context, err))
}

fn decode(document: Document) -> DomainResult<User> {
    UserDocument::from_document(document).map(User::from)
}

/// Wait for every sub-operation, then fail if any failed.
fn settle(results: Vec<DomainResult<User>>, operation: &str) -> DomainResult<Vec<User>> {
    let total = results.len();
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 && failed < total {
        tracing::warn!(
            operation,
            failed,
            succeeded = total - failed,
            "Batch partially applied; completed writes are not rolled back"
        );
    }
    results.into_iter().collect()
}

fn first_of(mut users: Vec<User>) -> DomainResult<User> {
    if users.is_empty() {
        return Err(DomainError::validation("Batch must contain at least one user."));
    }
    Ok(users.swap_remove(0))
}

#[async_trait]
impl Repository<User> for UserStore {
    async fn create(&self, data: OneOrMany<User>) -> DomainResult<ResponseData<User>> {
        match data {
            OneOrMany::One(user) => {
                let created = self.insert_one(user).await?;
                Ok(ResponseData::created(created, "User created successfully.").with_documents_modified(1))
            }
            OneOrMany::Many(users) => {
                if users.is_empty() {
                    return Err(DomainError::validation("Batch must contain at least one user."));
                }
                tracing::debug!(count = users.len(), "Creating users");
                let results = join_all(users.into_iter().map(|user| self.insert_one(user))).await;
                let created = settle(results, "create")?;
                let count = created.len() as u64;
                Ok(ResponseData::created(
                    first_of(created)?,
                    format!("{} user(s) created successfully.", count),
                )
                .with_documents_modified(count))
            }
        }
    }

    async fn update(&self, data: OneOrMany<User>) -> DomainResult<ResponseData<User>> {
        match data {
            OneOrMany::One(user) => {
                let updated = self.update_one(user).await?;
                Ok(ResponseData::ok(updated, "User updated successfully.").with_documents_modified(1))
            }
            OneOrMany::Many(users) => {
                if users.is_empty() {
                    return Err(DomainError::validation("Batch must contain at least one user."));
                }
                tracing::debug!(count = users.len(), "Updating users");
                let results = join_all(users.into_iter().map(|user| self.update_one(user))).await;
                let updated = settle(results, "update")?;
                let count = updated.len() as u64;
                Ok(ResponseData::ok(
                    first_of(updated)?,
                    format!("{} user(s) updated successfully.", count),
                )
                .with_documents_modified(count))
            }
        }
    }

    async fn delete(&self, id: ObjectId) -> DomainResult<ResponseData<User>> {
        let deleted = self
            .collection
            .delete_by_id(id)
            .await
            .map_err(|e| store_error("deleting user", e))?
            .ok_or_else(|| DomainError::not_found("User not found."))?;

        Ok(ResponseData::ok(decode(deleted)?, "User deleted successfully.").with_documents_modified(1))
    }

    async fn find(&self, id: ObjectId) -> DomainResult<ResponseData<User>> {
        let found = self
            .collection
            .find_by_id(id)
            .await
            .map_err(|e| store_error("finding user", e))?
            .ok_or_else(|| DomainError::not_found("User not found."))?;

        Ok(ResponseData::ok(decode(found)?, "User found successfully."))
    }

    async fn find_all(&self) -> DomainResult<ResponseData<Vec<User>>> {
        let users = self.list(doc! {}, 0, None, "finding all users").await?;
        Ok(ResponseData::ok(users, "Users retrieved successfully."))
    }

    async fn find_all_paginated(&self, page: u64, limit: u64) -> DomainResult<Paginated<User>> {
        self.paginate(doc! {}, page, limit, "finding users with pagination")
            .await
    }

    async fn count(&self) -> DomainResult<u64> {
        self.collection
            .count(doc! {})
            .await
            .map_err(|e| store_error("counting users", e))
    }

    async fn search(&self, filter: Filter) -> DomainResult<ResponseData<Vec<User>>> {
        let users = self.list(filter, 0, None, "searching users").await?;
        Ok(ResponseData::ok(users, "Users retrieved successfully."))
    }

    async fn search_paginated(&self, filter: Filter, page: u64, limit: u64) -> DomainResult<Paginated<User>> {
        self.paginate(filter, page, limit, "searching users with pagination")
            .await
    }

    async fn exists(&self, id: ObjectId) -> DomainResult<bool> {
        let count = self
            .collection
            .count(doc! { "_id": id })
            .await
            .map_err(|e| store_error("checking if user exists", e))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_email(&self, email: &str) -> DomainResult<ResponseData<User>> {
        let email = email.trim().to_lowercase();
        let user = self
            .find_one_by(doc! { "email": &email }, "finding user by email")
            .await?
            .ok_or_else(|| DomainError::not_found("User not found with the given email."))?;

        Ok(ResponseData::ok(user, "User found successfully."))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<ResponseData<User>> {
        let username = username.trim().to_lowercase();
        let user = self
            .find_one_by(doc! { "username": &username }, "finding user by username")
            .await?
            .ok_or_else(|| DomainError::not_found("User not found with the given username."))?;

        Ok(ResponseData::ok(user, "User found successfully."))
    }

    async fn authenticate(&self, username: &str, password: &str) -> DomainResult<ResponseData<User>> {
        let username = username.trim().to_lowercase();
        let invalid = || DomainError::authentication("Invalid username or password.");

        let user = self
            .find_one_by(doc! { "username": &username }, "finding user by username and password")
            .await?
            .ok_or_else(invalid)?;

        let hash = user.password_hash.clone().ok_or_else(invalid)?;
        let plain = password.to_string();
        let verified = tokio::task::spawn_blocking(move || Password::from_hash(hash).verify(&plain))
            .await
            .map_err(|e| DomainError::database(format!("Password verification task failed: {}", e)))?;

        if !verified {
            return Err(invalid());
        }
        Ok(ResponseData::ok(user, "User authenticated successfully."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MockDocumentCollection;
    use domain::ErrorKind;

    fn driver_failure() -> StoreError {
        StoreError::Malformed("connection reset".to_string())
    }

    fn stored_user(id: ObjectId) -> Document {
        doc! {
            "_id": id,
            "username": "john_doe",
            "email": "john@example.com",
            "passwordHash": "hash",
            "role": "admin",
            "kyc": true,
            "verify": false,
            "createdAt": BsonDateTime::now(),
            "updatedAt": BsonDateTime::now(),
        }
    }

    #[tokio::test]
    async fn test_store_failure_becomes_database_error() {
        let mut collection = MockDocumentCollection::new();
        collection
            .expect_find_by_id()
            .returning(|_| Err(driver_failure()));

        let store = UserStore::new(Arc::new(collection));
        let error = store.find(ObjectId::new()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Database);
        assert_eq!(error.status(), 500);
        assert!(error.message().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_absent_result_becomes_not_found() {
        let mut collection = MockDocumentCollection::new();
        collection.expect_find_by_id().returning(|_| Ok(None));
        collection.expect_delete_by_id().returning(|_| Ok(None));

        let store = UserStore::new(Arc::new(collection));

        let error = store.find(ObjectId::new()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.status(), 404);

        let error = store.delete(ObjectId::new()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_find_decodes_document() {
        let id = ObjectId::new();
        let mut collection = MockDocumentCollection::new();
        collection
            .expect_find_by_id()
            .withf(move |requested| *requested == id)
            .returning(move |id| Ok(Some(stored_user(id))));

        let store = UserStore::new(Arc::new(collection));
        let response = store.find(id).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.data.id, Some(id));
        assert!(response.data.is_admin());
        assert!(response.data.kyc);
        assert!(response.data.created_at.is_some());
    }

    #[tokio::test]
    async fn test_count_failure_in_pagination_is_database_error() {
        let mut collection = MockDocumentCollection::new();
        collection.expect_count().returning(|_| Err(driver_failure()));
        collection.expect_find().never();

        let store = UserStore::new(Arc::new(collection));
        let error = store.find_all_paginated(1, 10).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Database);
    }

    #[tokio::test]
    async fn test_invalid_page_rejected_before_store() {
        let mut collection = MockDocumentCollection::new();
        collection.expect_count().never();
        collection.expect_find().never();

        let store = UserStore::new(Arc::new(collection));
        let error = store.search_paginated(doc! {}, 0, 10).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_validation_blocks_write() {
        let mut collection = MockDocumentCollection::new();
        collection.expect_insert_one().never();

        let store = UserStore::new(Arc::new(collection));
        let user = User::new("ab", "john@example.com", "abc123!@");
        let error = store.create(user.into()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.field(), Some("username"));
    }

    #[tokio::test]
    async fn test_update_without_id_rejected() {
        let mut collection = MockDocumentCollection::new();
        collection.expect_update_by_id().never();

        let store = UserStore::new(Arc::new(collection));
        let user = User::new("john_doe", "john@example.com", "x").with_password_hash("hash");
        let error = store.update(user.into()).await.unwrap_err();

        assert_eq!(error.field(), Some("id"));
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let collection = MockDocumentCollection::new();
        let store = UserStore::new(Arc::new(collection));

        let error = store.create(OneOrMany::Many(Vec::new())).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
    }
}
