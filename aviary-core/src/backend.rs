//! Storage backend abstraction for the document store.
//!
//! This module defines the traits that abstract over different storage implementations,
//! allowing models to work against any document store (in-memory, MongoDB, ...).
//!
//! # Traits
//!
//! - [`StoreBackend`]: collection-scoped single-document operations with acknowledgements
//! - [`StoreBackendBuilder`]: factory establishing a backend, used by the
//!   [`ConnectionManager`](crate::connection::ConnectionManager)
//!
//! # Acknowledgements
//!
//! Backends report what the store acknowledged rather than interpreting it. The
//! [`Model`](crate::model::Model) validates the acknowledgement shape and turns an
//! unexpected shape into a specific error.

use async_trait::async_trait;
use bson::Document as BsonDocument;
use std::fmt::Debug;

use crate::{document::DocumentId, error::DocumentStoreResult};

/// Result of a single-document insert as reported by the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertAck {
    /// Whether the store reported success.
    pub ok: bool,
    /// The documents the store echoed back, each including its `_id`.
    pub inserted: Vec<BsonDocument>,
}

/// Result of a single-document delete as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteAck {
    /// Whether the store reported success.
    pub ok: bool,
    /// How many documents the store removed.
    pub deleted_count: u64,
}

/// Abstract interface for document storage backends.
///
/// All documents handed out by a backend carry their identifier in the `_id` field as
/// an object id. Implementations must be thread-safe and support concurrent access
/// from multiple async tasks.
///
/// # Concurrency
///
/// Backends provide no locking across operations. Two updates of the same document
/// race and the last write wins.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts one document into a collection, assigning it a new identifier.
    ///
    /// Any `_id` in `document` is replaced by the assigned identifier. The collection
    /// is created on first use.
    async fn insert_one(
        &self,
        collection: &str,
        document: BsonDocument,
    ) -> DocumentStoreResult<InsertAck>;

    /// Fetches the document with the given identifier, or `None` when nothing matches.
    async fn find_one(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> DocumentStoreResult<Option<BsonDocument>>;

    /// Overwrites the given top-level fields of one document and returns the document
    /// as it is after the update, or `None` when nothing matches.
    ///
    /// Fields absent from `changes` are left untouched.
    async fn find_one_and_update(
        &self,
        collection: &str,
        id: &DocumentId,
        changes: BsonDocument,
    ) -> DocumentStoreResult<Option<BsonDocument>>;

    /// Deletes at most one document with the given identifier.
    async fn delete_one(&self, collection: &str, id: &DocumentId)
    -> DocumentStoreResult<DeleteAck>;
}

/// Factory that establishes a backend connection.
///
/// `build` may be called again after a failed attempt, so it borrows the builder
/// instead of consuming it.
#[async_trait]
pub trait StoreBackendBuilder: Send + Sync + Debug {
    type Backend: StoreBackend + 'static;

    /// Connects to the store.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Connection`](crate::error::DocumentStoreError::Connection)
    /// if the store cannot be reached or the address is invalid.
    async fn build(&self) -> DocumentStoreResult<Self::Backend>;
}
