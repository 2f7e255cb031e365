//! User service configuration.

use std::env;
use std::path::PathBuf;

use common::{DatabaseConfig, LogConfig, RunMode};

/// User service configuration.
#[derive(Debug, Clone, Default)]
pub struct UserServiceConfig {
    /// Document store connection settings
    pub database: DatabaseConfig,
    /// Error log and tracing settings
    pub log: LogConfig,
    /// Controls stack/reference visibility in error reports
    pub run_mode: RunMode,
}

impl UserServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database_defaults = DatabaseConfig::default();
        let log_defaults = LogConfig::default();

        Self {
            database: DatabaseConfig {
                url: env::var("USER_SERVICE_MONGODB_URI")
                    .or_else(|_| env::var("MONGODB_URI"))
                    .unwrap_or(database_defaults.url),
                name: env::var("USER_SERVICE_DATABASE_NAME")
                    .or_else(|_| env::var("DATABASE_NAME"))
                    .unwrap_or(database_defaults.name),
                users_collection: env::var("USER_SERVICE_USERS_COLLECTION")
                    .unwrap_or(database_defaults.users_collection),
            },
            log: LogConfig {
                dir: env::var("LOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(log_defaults.dir),
                level: env::var("LOG_LEVEL").unwrap_or(log_defaults.level),
            },
            run_mode: env::var("APP_ENV")
                .ok()
                .and_then(|mode| mode.parse().ok())
                .unwrap_or_default(),
        }
    }
}
