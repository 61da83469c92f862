//! Collection-bound models.
//!
//! A [`Model`] binds one collection name to the shared
//! [`ConnectionManager`](crate::connection::ConnectionManager) and exposes the four
//! single-document operations. It holds no other state; cloning a model is cheap and
//! every clone talks to the same connection.
//!
//! Models never swallow store failures. They check the acknowledgement the backend
//! reports and raise a specific [`DocumentStoreError`] when its shape is wrong; every
//! other failure is returned unchanged.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use aviary_core::{connection::ConnectionManager, model::Model};
//!
//! let connection = Arc::new(ConnectionManager::new(builder));
//! let birds = Model::new(Arc::clone(&connection), "birds");
//!
//! connection.connect().await?;
//! let robin = birds.insert_one(fields).await?;
//! let same = birds.find_one_by_id(&robin.id().to_hex()).await?;
//! ```

use std::sync::Arc;
use tracing::debug;

use crate::{
    connection::{Connection, ConnectionManager},
    document::{Document, Fields, fields_to_bson, parse_id},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// A named binding between a collection and the shared connection.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    connection: Arc<ConnectionManager>,
}

impl Model {
    pub fn new(connection: Arc<ConnectionManager>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection,
        }
    }

    /// Returns the name of the collection this model is bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn backend(&self) -> DocumentStoreResult<&Connection> {
        self.connection
            .connection()
            .ok_or_else(|| DocumentStoreError::NotConnected(self.name.clone()))
    }

    /// Inserts a document and returns it as stored, including its assigned id.
    ///
    /// Any `id` or `_id` field in `fields` is ignored.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotConnected`] before a successful connect
    /// - [`DocumentStoreError::Insert`] if the store does not acknowledge the insert or
    ///   echoes back anything other than exactly one document with an id
    pub async fn insert_one(&self, fields: Fields) -> DocumentStoreResult<Document> {
        let backend = self.backend()?;
        let ack = backend
            .insert_one(&self.name, fields_to_bson(fields)?)
            .await?;

        if !ack.ok {
            return Err(self.insert_error("store did not acknowledge the insert"));
        }
        let [inserted] = <[_; 1]>::try_from(ack.inserted).map_err(|echoed| {
            self.insert_error(format!("expected 1 echoed document, got {}", echoed.len()))
        })?;

        let document = Document::from_bson(inserted)
            .map_err(|err| self.insert_error(err.to_string()))?;
        debug!(collection = %self.name, id = %document.id(), "inserted document");

        Ok(document)
    }

    /// Looks up a document by its identifier string.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotConnected`] before a successful connect
    /// - [`DocumentStoreError::InvalidId`] if `id` is not a valid identifier
    /// - [`DocumentStoreError::DocumentNotFound`] if no document has that identifier
    pub async fn find_one_by_id(&self, id: &str) -> DocumentStoreResult<Document> {
        let backend = self.backend()?;
        let id = parse_id(id)?;

        match backend.find_one(&self.name, &id).await? {
            Some(raw) => Document::from_bson(raw),
            None => Err(self.not_found(&id.to_hex())),
        }
    }

    /// Overwrites the given fields of a document and returns the document after the update.
    ///
    /// This is a shallow merge, not a replace: fields missing from `changes` keep their
    /// stored values. Identifier fields in `changes` are ignored. An empty `changes`
    /// leaves the document as it is and returns it.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotConnected`] before a successful connect
    /// - [`DocumentStoreError::InvalidId`] if `id` is not a valid identifier
    /// - [`DocumentStoreError::DocumentNotFound`] if no document has that identifier
    pub async fn find_one_and_update(
        &self,
        id: &str,
        changes: Fields,
    ) -> DocumentStoreResult<Document> {
        let backend = self.backend()?;
        let id = parse_id(id)?;

        match backend
            .find_one_and_update(&self.name, &id, fields_to_bson(changes)?)
            .await?
        {
            Some(raw) => Document::from_bson(raw),
            None => Err(self.not_found(&id.to_hex())),
        }
    }

    /// Deletes the document with the given identifier.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::NotConnected`] before a successful connect
    /// - [`DocumentStoreError::InvalidId`] if `id` is not a valid identifier
    /// - [`DocumentStoreError::DocumentNotFound`] if nothing was deleted
    /// - [`DocumentStoreError::InvariantViolation`] if the store did not acknowledge the
    ///   delete or reports more than one removed document
    pub async fn remove_one(&self, id: &str) -> DocumentStoreResult<()> {
        let backend = self.backend()?;
        let id = parse_id(id)?;
        let ack = backend.delete_one(&self.name, &id).await?;

        if !ack.ok {
            return Err(DocumentStoreError::InvariantViolation(format!(
                "delete of {id} in collection {} was not acknowledged",
                self.name
            )));
        }

        match ack.deleted_count {
            0 => Err(self.not_found(&id.to_hex())),
            1 => {
                debug!(collection = %self.name, %id, "removed document");
                Ok(())
            }
            n => Err(DocumentStoreError::InvariantViolation(format!(
                "delete of {id} in collection {} removed {n} documents",
                self.name
            ))),
        }
    }

    fn not_found(&self, id: &str) -> DocumentStoreError {
        DocumentStoreError::DocumentNotFound(id.to_string(), self.name.clone())
    }

    fn insert_error(&self, reason: impl Into<String>) -> DocumentStoreError {
        DocumentStoreError::Insert(self.name.clone(), reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::{DeleteAck, InsertAck, StoreBackend, StoreBackendBuilder},
        document::DocumentId,
    };
    use async_trait::async_trait;
    use bson::{Document as BsonDocument, doc, oid::ObjectId};
    use serde_json::json;

    /// A backend that answers every call with canned acknowledgements.
    #[derive(Debug, Clone, Default)]
    struct ScriptedBackend {
        insert: InsertAck,
        delete: DeleteAck,
    }

    #[async_trait]
    impl StoreBackend for ScriptedBackend {
        async fn insert_one(&self, _: &str, _: BsonDocument) -> DocumentStoreResult<InsertAck> {
            Ok(self.insert.clone())
        }

        async fn find_one(
            &self,
            _: &str,
            _: &DocumentId,
        ) -> DocumentStoreResult<Option<BsonDocument>> {
            Err(DocumentStoreError::Backend("server selection timeout".into()))
        }

        async fn find_one_and_update(
            &self,
            _: &str,
            _: &DocumentId,
            _: BsonDocument,
        ) -> DocumentStoreResult<Option<BsonDocument>> {
            Ok(None)
        }

        async fn delete_one(&self, _: &str, _: &DocumentId) -> DocumentStoreResult<DeleteAck> {
            Ok(self.delete)
        }
    }

    #[async_trait]
    impl StoreBackendBuilder for ScriptedBackend {
        type Backend = ScriptedBackend;

        async fn build(&self) -> DocumentStoreResult<ScriptedBackend> {
            Ok(self.clone())
        }
    }

    async fn connected(backend: ScriptedBackend) -> Model {
        let connection = Arc::new(ConnectionManager::new(backend));
        connection.connect().await.unwrap();
        Model::new(connection, "birds")
    }

    fn robin() -> Fields {
        json!({ "name": "robin" }).as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn operations_before_connect_fail() {
        let model = Model::new(
            Arc::new(ConnectionManager::new(ScriptedBackend::default())),
            "birds",
        );
        let id = ObjectId::new().to_hex();

        assert!(matches!(model.insert_one(robin()).await, Err(DocumentStoreError::NotConnected(name)) if name == "birds"));
        assert!(matches!(model.find_one_by_id(&id).await, Err(DocumentStoreError::NotConnected(_))));
        assert!(matches!(
            model.find_one_and_update(&id, robin()).await,
            Err(DocumentStoreError::NotConnected(_))
        ));
        assert!(matches!(model.remove_one(&id).await, Err(DocumentStoreError::NotConnected(_))));
    }

    #[tokio::test]
    async fn unacknowledged_insert_is_an_insert_error() {
        let model = connected(ScriptedBackend {
            insert: InsertAck {
                ok: false,
                inserted: vec![doc! { "_id": ObjectId::new(), "name": "robin" }],
            },
            ..Default::default()
        })
        .await;

        assert!(matches!(model.insert_one(robin()).await, Err(DocumentStoreError::Insert(..))));
    }

    #[tokio::test]
    async fn insert_must_echo_exactly_one_document() {
        let none = connected(ScriptedBackend {
            insert: InsertAck { ok: true, inserted: vec![] },
            ..Default::default()
        })
        .await;
        let two = connected(ScriptedBackend {
            insert: InsertAck {
                ok: true,
                inserted: vec![
                    doc! { "_id": ObjectId::new() },
                    doc! { "_id": ObjectId::new() },
                ],
            },
            ..Default::default()
        })
        .await;
        let without_id = connected(ScriptedBackend {
            insert: InsertAck { ok: true, inserted: vec![doc! { "name": "robin" }] },
            ..Default::default()
        })
        .await;

        assert!(matches!(none.insert_one(robin()).await, Err(DocumentStoreError::Insert(..))));
        assert!(matches!(two.insert_one(robin()).await, Err(DocumentStoreError::Insert(..))));
        assert!(matches!(without_id.insert_one(robin()).await, Err(DocumentStoreError::Insert(..))));
    }

    #[tokio::test]
    async fn acknowledged_insert_returns_echoed_document() {
        let id = ObjectId::new();
        let model = connected(ScriptedBackend {
            insert: InsertAck { ok: true, inserted: vec![doc! { "_id": id, "name": "robin" }] },
            ..Default::default()
        })
        .await;

        let document = model.insert_one(robin()).await.unwrap();

        assert_eq!(document.id(), &id);
        assert_eq!(document.get("name"), Some(&json!("robin")));
    }

    #[tokio::test]
    async fn invalid_id_is_checked_before_the_store() {
        let model = connected(ScriptedBackend::default()).await;

        // find_one would fail with a backend error if it were reached
        assert!(matches!(model.find_one_by_id("nope").await, Err(DocumentStoreError::InvalidId(_))));
        assert!(matches!(model.remove_one("nope").await, Err(DocumentStoreError::InvalidId(_))));
    }

    #[tokio::test]
    async fn store_failures_pass_through_unchanged() {
        let model = connected(ScriptedBackend::default()).await;

        let result = model.find_one_by_id(&ObjectId::new().to_hex()).await;

        assert!(matches!(result, Err(DocumentStoreError::Backend(message)) if message == "server selection timeout"));
    }

    #[tokio::test]
    async fn update_without_match_is_not_found() {
        let model = connected(ScriptedBackend::default()).await;
        let id = ObjectId::new().to_hex();

        let result = model.find_one_and_update(&id, robin()).await;

        assert!(matches!(result, Err(DocumentStoreError::DocumentNotFound(missing, collection)) if missing == id && collection == "birds"));
    }

    #[tokio::test]
    async fn delete_counts_are_validated() {
        let id = ObjectId::new().to_hex();
        let zero = connected(ScriptedBackend {
            delete: DeleteAck { ok: true, deleted_count: 0 },
            ..Default::default()
        })
        .await;
        let one = connected(ScriptedBackend {
            delete: DeleteAck { ok: true, deleted_count: 1 },
            ..Default::default()
        })
        .await;
        let two = connected(ScriptedBackend {
            delete: DeleteAck { ok: true, deleted_count: 2 },
            ..Default::default()
        })
        .await;
        let unacknowledged = connected(ScriptedBackend {
            delete: DeleteAck { ok: false, deleted_count: 1 },
            ..Default::default()
        })
        .await;

        assert!(matches!(zero.remove_one(&id).await, Err(DocumentStoreError::DocumentNotFound(..))));
        assert!(one.remove_one(&id).await.is_ok());
        assert!(matches!(two.remove_one(&id).await, Err(DocumentStoreError::InvariantViolation(_))));
        assert!(matches!(
            unacknowledged.remove_one(&id).await,
            Err(DocumentStoreError::InvariantViolation(_))
        ));
    }
}
