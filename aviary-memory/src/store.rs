//! In-memory storage implementation for document stores.
//!
//! Documents are kept as BSON documents in hash maps keyed by collection name and
//! object id, behind an async-aware read-write lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document, oid::ObjectId};

use aviary_core::{
    backend::{DeleteAck, InsertAck, StoreBackend, StoreBackendBuilder},
    document::{DocumentId, STORE_ID_FIELD},
    error::DocumentStoreResult,
};

type CollectionMap = HashMap<DocumentId, Document>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones
/// share the same underlying data. Every operation takes the lock once, which makes
/// each single-document operation atomic with respect to the others.
///
/// # Example
///
/// ```ignore
/// use aviary_memory::InMemoryStore;
/// use aviary_core::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let ack = store.insert_one("birds", doc! { "name": "robin" }).await?;
/// assert!(ack.ok);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (document_id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for connecting to a fresh `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns how many documents a collection holds (zero for unknown collections).
    pub async fn document_count(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map_or(0, HashMap::len)
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_one(&self, collection: &str, document: Document) -> DocumentStoreResult<InsertAck> {
        let id = ObjectId::new();
        let stored = Document::from_iter(
            [(STORE_ID_FIELD.to_string(), Bson::ObjectId(id))]
                .into_iter()
                .chain(
                    document
                        .into_iter()
                        .filter(|(key, _)| key != STORE_ID_FIELD),
                ),
        );

        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id, stored.clone());

        Ok(InsertAck { ok: true, inserted: vec![stored] })
    }

    async fn find_one(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<Option<Document>> {
        Ok(
            self.store
                .read()
                .await
                .get(collection)
                .and_then(|documents| documents.get(id))
                .cloned()
        )
    }

    async fn find_one_and_update(&self, collection: &str, id: &DocumentId, changes: Document) -> DocumentStoreResult<Option<Document>> {
        let mut store = self.store.write().await;
        let document = match store
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
        {
            Some(document) => document,
            None => return Ok(None),
        };

        for (key, value) in changes {
            if key != STORE_ID_FIELD {
                document.insert(key, value);
            }
        }

        Ok(Some(document.clone()))
    }

    async fn delete_one(&self, collection: &str, id: &DocumentId) -> DocumentStoreResult<DeleteAck> {
        let removed = self.store
            .write()
            .await
            .get_mut(collection)
            .and_then(|documents| documents.remove(id));

        Ok(DeleteAck {
            ok: true,
            deleted_count: u64::from(removed.is_some()),
        })
    }
}


/// Builder for connecting to an [`InMemoryStore`].
///
/// Connecting never fails. By default every build hands out the same fresh store;
/// [`InMemoryStoreBuilder::with_store`] connects to an existing one instead, which lets
/// tests inspect what the models wrote.
#[derive(Default, Clone, Debug)]
pub struct InMemoryStoreBuilder {
    store: InMemoryStore,
}

impl InMemoryStoreBuilder {
    pub fn with_store(store: InMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(&self) -> DocumentStoreResult<Self::Backend> {
        Ok(self.store.clone())
    }
}
