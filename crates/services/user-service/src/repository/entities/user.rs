//! User document as stored in the `users` collection.
//!
//! This is the persistence-layer shape: it is built only from a validated,
//! normalized [`User`] and never carries a raw password.

use bson::{oid::ObjectId, DateTime as BsonDateTime, Document};
use serde::{Deserialize, Serialize};

use domain::{DomainError, DomainResult, Password, User, UserRole};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub role: String,
    #[serde(default)]
    pub kyc: bool,
    #[serde(default)]
    pub verify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
}

/// Trim and lowercase identity fields, trim the optional ones.
pub fn normalize(mut user: User) -> User {
    user.username = user.username.trim().to_lowercase();
    user.email = user.email.trim().to_lowercase();
    user.phone = user.phone.map(|p| p.trim().to_string());
    user
}

/// Hash the raw password off the async executor.
async fn hash_password(raw: String) -> DomainResult<String> {
    tokio::task::spawn_blocking(move || Password::new(&raw))
        .await
        .map_err(|e| DomainError::database(format!("Password hashing task failed: {}", e)))?
        .map(Password::into_string)
}

impl UserDocument {
    /// Normalize, validate and hash a user for writing.
    ///
    /// Returns a validation error naming the first offending field. A raw
    /// password takes precedence over an existing hash.
    pub async fn prepare(user: User) -> DomainResult<Self> {
        let user = normalize(user);
        user.validate_fields()?;

        let password_hash = match user.password {
            Some(raw) => Some(hash_password(raw).await?),
            None => user.password_hash,
        };

        Ok(Self {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash,
            role: user.role.into(),
            kyc: user.kyc,
            verify: user.verify,
            phone: user.phone,
            display_name: user.display_name,
            first_name: user.first_name,
            last_name: user.last_name,
            address: user.address,
            created_at: user.created_at.map(BsonDateTime::from_chrono),
            updated_at: user.updated_at.map(BsonDateTime::from_chrono),
        })
    }

    /// Body for an insert: no `_id`, both timestamps set to `now`.
    pub fn insert_body(&mut self, now: BsonDateTime) -> DomainResult<Document> {
        if self.password_hash.is_none() {
            return Err(DomainError::invalid_field("password", "Password is required."));
        }
        self.id = None;
        self.created_at = Some(now);
        self.updated_at = Some(now);
        bson::to_document(self)
            .map_err(|e| DomainError::database(format!("Error encoding user: {}", e)))
    }

    /// `$set` body for an update: never rewrites `_id` or `createdAt`.
    pub fn update_body(&mut self, now: BsonDateTime) -> DomainResult<Document> {
        self.updated_at = Some(now);
        let mut fields = bson::to_document(self)
            .map_err(|e| DomainError::database(format!("Error encoding user: {}", e)))?;
        fields.remove("_id");
        fields.remove("createdAt");
        Ok(bson::doc! { "$set": fields })
    }

    pub fn from_document(document: Document) -> DomainResult<Self> {
        bson::from_document(document)
            .map_err(|e| DomainError::database(format!("Error decoding user: {}", e)))
    }
}

/// Convert stored document to domain entity
impl From<UserDocument> for User {
    fn from(document: UserDocument) -> Self {
        User {
            id: document.id,
            username: document.username,
            email: document.email,
            password: None,
            password_hash: document.password_hash,
            role: UserRole::from(document.role),
            kyc: document.kyc,
            verify: document.verify,
            phone: document.phone,
            display_name: document.display_name,
            first_name: document.first_name,
            last_name: document.last_name,
            address: document.address,
            created_at: document.created_at.map(BsonDateTime::to_chrono),
            updated_at: document.updated_at.map(BsonDateTime::to_chrono),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ErrorKind;

    #[tokio::test]
    async fn test_prepare_normalizes_and_hashes() {
        let user = User::new("  John_Doe ", " John@Example.COM ", "abc123!@");
        let document = UserDocument::prepare(user).await.unwrap();

        assert_eq!(document.username, "john_doe");
        assert_eq!(document.email, "john@example.com");
        let hash = document.password_hash.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(Password::from_hash(hash).verify("abc123!@"));
    }

    #[tokio::test]
    async fn test_prepare_rejects_invalid_field() {
        let user = User::new("john_doe", "not-an-email", "abc123!@");
        let error = UserDocument::prepare(user).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.field(), Some("email"));
    }

    #[tokio::test]
    async fn test_insert_requires_password() {
        let mut user = User::new("john_doe", "john@example.com", "unused");
        user.password = None;
        let mut document = UserDocument::prepare(user).await.unwrap();

        let error = document.insert_body(BsonDateTime::now()).unwrap_err();
        assert_eq!(error.field(), Some("password"));
    }

    #[tokio::test]
    async fn test_bodies_never_carry_raw_password() {
        let user = User::new("john_doe", "john@example.com", "unused").with_password_hash("stored-hash");
        let mut document = UserDocument::prepare(user).await.unwrap();
        let now = BsonDateTime::now();

        let insert = document.insert_body(now).unwrap();
        assert!(insert.get("password").is_none());
        assert_eq!(insert.get_str("passwordHash").unwrap(), "stored-hash");
        assert_eq!(insert.get_datetime("createdAt").unwrap(), &now);
        assert!(insert.get("_id").is_none());

        let update = document.update_body(now).unwrap();
        let set = update.get_document("$set").unwrap();
        assert!(set.get("createdAt").is_none());
        assert!(set.get("_id").is_none());
        assert_eq!(set.get_str("role").unwrap(), "user");
    }
}
