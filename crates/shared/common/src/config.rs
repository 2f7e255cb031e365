//! Shared configuration structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use domain::RunMode;

/// Document store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`
    pub url: String,
    /// Database holding the collections
    pub name: String,
    /// Collection storing user documents
    pub users_collection: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            name: "user_db".to_string(),
            users_collection: "users".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Directory receiving persisted error records
    pub dir: PathBuf,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}
