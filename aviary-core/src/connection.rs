//! Process-lifetime connection handling.
//!
//! A [`ConnectionManager`] owns the single connection to the document store. It is
//! created once at startup, shared (behind an `Arc`) with every [`Model`](crate::model::Model),
//! and connects lazily on the first call to [`ConnectionManager::connect`].
//!
//! Concurrent first calls are deduplicated: exactly one of them runs the backend
//! builder while the others wait for its outcome. Once connected, `connect` is a no-op.
//! A failed attempt leaves the manager unconnected so a later call can try again.
//! There is no disconnect; the connection lives as long as the process.

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// A shared handle to an established backend.
pub type Connection = Arc<dyn StoreBackend>;

/// Type-erased [`StoreBackendBuilder`], so the manager does not carry the backend type.
#[async_trait]
trait DynStoreBackendBuilder: Send + Sync + Debug {
    async fn build_connection(&self) -> DocumentStoreResult<Connection>;
}

#[async_trait]
impl<B: StoreBackendBuilder> DynStoreBackendBuilder for B {
    async fn build_connection(&self) -> DocumentStoreResult<Connection> {
        Ok(Arc::new(self.build().await?))
    }
}

/// Owns the lazily established, process-wide store connection.
#[derive(Debug)]
pub struct ConnectionManager {
    builder: Box<dyn DynStoreBackendBuilder>,
    connection: OnceCell<Connection>,
}

impl ConnectionManager {
    /// Creates an unconnected manager that will use `builder` to connect.
    pub fn new<B: StoreBackendBuilder + 'static>(builder: B) -> Self {
        Self {
            builder: Box::new(builder),
            connection: OnceCell::new(),
        }
    }

    /// Establishes the connection if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`] if the connect attempt fails. Errors
    /// of any other kind raised by the builder are reported as connection errors too.
    pub async fn connect(&self) -> DocumentStoreResult<()> {
        if self.connection.initialized() {
            return Ok(());
        }

        self.connection
            .get_or_try_init(|| async {
                debug!("connecting to document store");

                match self.builder.build_connection().await {
                    Ok(connection) => {
                        info!("connected to document store");
                        Ok(connection)
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to connect to document store");
                        Err(match err {
                            DocumentStoreError::Connection(_) => err,
                            other => DocumentStoreError::Connection(other.to_string()),
                        })
                    }
                }
            })
            .await?;

        Ok(())
    }

    /// Returns the established connection, if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.get()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }
}
