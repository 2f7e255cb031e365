//! Database connection lifecycle.

use bson::{doc, Document};
use mongodb::Client;
use tokio::sync::OnceCell;

use common::DatabaseConfig;
use domain::{DomainError, DomainResult};

use super::mongo::MongoCollection;

/// Fields carrying a unique index on the users collection.
pub const USER_UNIQUE_FIELDS: &[&str] = &["username", "email"];

/// Explicitly constructed handle to the document store.
///
/// The client is established lazily on first use. Concurrent first callers
/// wait on the same initialization, so at most one handshake happens and
/// every caller receives the same client.
pub struct Database {
    config: DatabaseConfig,
    client: OnceCell<Client>,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get the shared client, connecting on first call.
    pub async fn client(&self) -> DomainResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                let client = Client::with_uri_str(&self.config.url).await?;
                client
                    .database("admin")
                    .run_command(doc! { "ping": 1 })
                    .await?;
                tracing::info!(database = %self.config.name, "Database connected");
                Ok::<_, mongodb::error::Error>(client)
            })
            .await
            .map_err(|e| DomainError::database(format!("Error connecting to database: {}", e)))
    }

    /// Users collection adapter.
    pub async fn users(&self) -> DomainResult<MongoCollection> {
        let client = self.client().await?;
        let collection = client
            .database(&self.config.name)
            .collection::<Document>(&self.config.users_collection);
        Ok(MongoCollection::new(collection))
    }

    /// Create the unique indexes user documents rely on.
    pub async fn ensure_indexes(&self) -> DomainResult<()> {
        self.users()
            .await?
            .ensure_unique(USER_UNIQUE_FIELDS)
            .await
            .map_err(|e| DomainError::database(format!("Error creating indexes: {}", e)))?;
        tracing::info!("Unique indexes on {:?} ensured", USER_UNIQUE_FIELDS);
        Ok(())
    }

    /// Check database connectivity.
    pub async fn ping(&self) -> DomainResult<()> {
        self.client()
            .await?
            .database(&self.config.name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| DomainError::database(format!("Ping failed: {}", e)))?;
        Ok(())
    }

    /// Close the client if one was established.
    pub async fn shutdown(self) {
        if let Some(client) = self.client.into_inner() {
            client.shutdown().await;
            tracing::info!("Database connection closed");
        }
    }
}
