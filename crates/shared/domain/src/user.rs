//! User domain entity and related types.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{ROLE_ADMIN, ROLE_USER};
use crate::error::{DomainError, DomainResult};

/// Store-assigned user identifier
pub type UserId = ObjectId;

/// User roles.
///
/// `user` and `admin` are known to the service; any other stored role string
/// is carried through unchanged as [`UserRole::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    #[default]
    User,
    Admin,
    Other(String),
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Admin => ROLE_ADMIN,
            UserRole::User => ROLE_USER,
            UserRole::Other(role) => role,
        }
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            ROLE_USER => UserRole::User,
            other => UserRole::Other(other.to_string()),
        }
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        match s.as_str() {
            ROLE_ADMIN => UserRole::Admin,
            ROLE_USER => UserRole::User,
            _ => UserRole::Other(s),
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields checked in this order; the first failure is reported.
const VALIDATED_FIELDS: [&str; 4] = ["username", "email", "password", "phone"];

/// User domain entity.
///
/// `id`, `created_at` and `updated_at` are assigned by the store. A raw
/// `password` is only ever an input: the persistence layer hashes it into
/// `password_hash` and never writes the raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[validate(custom(function = "crate::validators::username_rule"))]
    pub username: String,
    #[validate(custom(function = "crate::validators::email_rule"))]
    pub email: String,
    #[serde(default, skip_serializing)]
    #[validate(custom(function = "crate::validators::password_rule"))]
    pub password: Option<String>,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub kyc: bool,
    #[serde(default)]
    pub verify: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "crate::validators::phone_rule"))]
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
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new, not yet persisted user with the default role
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Attach an already derived password hash instead of a raw password
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password = None;
        self.password_hash = Some(hash.into());
        self
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Run every field validator, reporting the first offending field.
    pub fn validate_fields(&self) -> DomainResult<()> {
        let Err(errors) = self.validate() else {
            return Ok(());
        };

        let field_errors = errors.field_errors();
        for field in VALIDATED_FIELDS {
            if let Some(error) = field_errors.get(field).and_then(|list| list.first()) {
                let message = error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                return Err(DomainError::invalid_field(field, message));
            }
        }

        Err(DomainError::validation(errors.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_role_defaults_to_user() {
        let user = User::new("john_doe", "john@example.com", "abc123!@");
        assert_eq!(user.role, UserRole::User);
        assert!(!user.kyc);
        assert!(!user.verify);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(UserRole::from("admin"), UserRole::Admin);
        assert_eq!(UserRole::from("user"), UserRole::User);
        assert_eq!(UserRole::from("moderator"), UserRole::Other("moderator".to_string()));
        assert_eq!(String::from(UserRole::Admin), "admin");
    }

    #[test]
    fn test_custom_role_round_trips() {
        let user = User::new("john_doe", "john@example.com", "abc123!@")
            .with_role(UserRole::from("moderator"));
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "moderator");

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back.role, UserRole::Other("moderator".to_string()));
        assert!(!back.is_admin());
    }

    #[test]
    fn test_valid_user_passes() {
        let user = User::new("john_doe", "john@example.com", "abc123!@").with_phone("1234567890");
        assert!(user.validate_fields().is_ok());
    }

    #[test]
    fn test_first_invalid_field_reported() {
        let user = User::new("ab", "not-an-email", "abcdefgh");
        let error = user.validate_fields().unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.field(), Some("username"));
    }

    #[test]
    fn test_invalid_phone_reported() {
        let user = User::new("john_doe", "john@example.com", "abc123!@").with_phone("12345");
        let error = user.validate_fields().unwrap_err();
        assert_eq!(error.field(), Some("phone"));
    }

    #[test]
    fn test_hash_only_user_skips_password_rule() {
        let user = User::new("john_doe", "john@example.com", "x").with_password_hash("$argon2id$stub");
        assert!(user.validate_fields().is_ok());
        assert!(user.password.is_none());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let user = User::new("john_doe", "john@example.com", "abc123!@").with_password_hash("hash");
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "user");
    }
}
