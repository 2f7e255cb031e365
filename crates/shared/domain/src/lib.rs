//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! The user entity, its field rules, and the classified error type are shared
//! by every crate that touches user records.

pub mod constants;
pub mod error;
pub mod password;
pub mod run_mode;
pub mod user;
pub mod validators;

pub use constants::*;
pub use error::{DomainError, DomainResult, ErrorKind, ErrorReport};
pub use password::Password;
pub use run_mode::RunMode;
pub use user::{User, UserId, UserRole};
