//! User Service Library
//!
//! Persistence for user records: a generic repository contract, its
//! MongoDB-backed implementation, and the connection lifecycle it runs on.
//! The binary wraps a few maintenance commands around it.

pub mod config;
pub mod infra;
pub mod repository;

use std::sync::Arc;

use bson::oid::ObjectId;
use serde_json::Value;
use tracing::info;

use domain::{DomainError, DomainResult};

use crate::infra::Database;
use crate::repository::{Repository, UserStore};

/// Maintenance operation run against the users collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the unique indexes on username and email
    Indexes,
    /// Check connectivity
    Ping,
    /// Count stored users
    Count,
    /// List one page of users
    List { page: u64, limit: u64 },
    /// Fetch a user by id
    Get { id: String },
    /// Remove a user by id
    Delete { id: String },
}

/// Build the user repository on the shared connection.
pub async fn user_store(db: &Database) -> DomainResult<UserStore> {
    let collection = db.users().await?;
    Ok(UserStore::new(Arc::new(collection)))
}

/// Parse a hex object id, failing as a validation error on `id`.
pub fn parse_id(raw: &str) -> DomainResult<ObjectId> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| DomainError::invalid_field("id", format!("'{}' is not a valid user id.", raw)))
}

/// Run one command and return its JSON result.
pub async fn run_command(db: &Database, command: Command) -> DomainResult<Value> {
    match command {
        Command::Indexes => {
            db.ensure_indexes().await?;
            Ok(serde_json::json!({ "status": 200, "message": "Indexes ensured." }))
        }
        Command::Ping => {
            db.ping().await?;
            info!(database = %db.config().name, "Ping succeeded");
            Ok(serde_json::json!({ "status": 200, "message": "Database reachable." }))
        }
        Command::Count => {
            let total = user_store(db).await?.count().await?;
            Ok(serde_json::json!({ "status": 200, "count": total }))
        }
        Command::List { page, limit } => {
            let page = user_store(db).await?.find_all_paginated(page, limit).await?;
            to_json(&page)
        }
        Command::Get { id } => {
            let id = parse_id(&id)?;
            let found = user_store(db).await?.find(id).await?;
            to_json(&found)
        }
        Command::Delete { id } => {
            let id = parse_id(&id)?;
            let deleted = user_store(db).await?.delete(id).await?;
            to_json(&deleted)
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> DomainResult<Value> {
    serde_json::to_value(value).map_err(|e| DomainError::database(format!("Error encoding result: {}", e)))
}
