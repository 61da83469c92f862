//! The process-lifetime database context.
//!
//! [`Database`] is built once at startup and handed to the router as state. It owns
//! the single [`ConnectionManager`] and the models bound to it; cloning it only clones
//! `Arc`s, so every request sees the same connection.

use std::sync::Arc;

use aviary_core::{
    connection::ConnectionManager, error::DocumentStoreResult, model::Model,
};
use aviary_memory::InMemoryStoreBuilder;

use crate::config::{ConfigError, ConfigResult, DbConfig};

/// Collection holding the birds served under `/birds`.
pub const BIRDS: &str = "birds";

#[derive(Debug, Clone)]
pub struct Database {
    connection: Arc<ConnectionManager>,
    birds: Model,
}

impl Database {
    pub fn new(connection: ConnectionManager) -> Self {
        let connection = Arc::new(connection);
        let birds = Model::new(Arc::clone(&connection), BIRDS);

        Self { connection, birds }
    }

    /// Chooses the store from the scheme of the configured address.
    ///
    /// Nothing is contacted here; the connection is established by the first
    /// [`Database::connect`].
    pub fn from_config(config: &DbConfig) -> ConfigResult<Self> {
        let url = config.url.as_str();

        if url.starts_with("memory://") {
            return Ok(Self::new(ConnectionManager::new(
                InMemoryStoreBuilder::default(),
            )));
        }

        #[cfg(feature = "mongodb")]
        {
            if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
                let mut builder = aviary_mongodb::MongoDbStore::builder(url);
                if let Some(name) = &config.name {
                    builder = builder.database(name.clone());
                }
                if let Some(timeout) = config.server_selection_timeout() {
                    builder = builder.server_selection_timeout(timeout);
                }
                return Ok(Self::new(ConnectionManager::new(builder)));
            }
        }

        Err(ConfigError::UnsupportedStore(url.to_string()))
    }

    /// Connects to the store unless already connected. Safe to call on every request.
    pub async fn connect(&self) -> DocumentStoreResult<()> {
        self.connection.connect().await
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn birds(&self) -> &Model {
        &self.birds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_config(url: &str) -> DbConfig {
        DbConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn memory_address_selects_the_in_memory_store() {
        let db = Database::from_config(&db_config("memory://")).unwrap();

        assert!(!db.is_connected());
        db.connect().await.unwrap();
        assert!(db.is_connected());
        assert_eq!(db.birds().name(), BIRDS);
    }

    #[cfg(feature = "mongodb")]
    #[test]
    fn mongodb_address_is_accepted_without_connecting() {
        let db = Database::from_config(&db_config("mongodb://localhost:1/aviary")).unwrap();

        assert!(!db.is_connected());
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let result = Database::from_config(&db_config("postgres://localhost/aviary"));

        assert!(matches!(result, Err(ConfigError::UnsupportedStore(url)) if url.starts_with("postgres")));
    }
}
