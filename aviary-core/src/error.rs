//! Error types and result types for document store operations.
//!
//! Every fallible operation in the data-access layer returns a
//! [`DocumentStoreResult<T>`]. The variants are deliberately distinct so that callers
//! (in particular the HTTP boundary) can tell a malformed identifier apart from a
//! well-formed identifier that matches nothing.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The store could not be reached while establishing the connection.
    #[error("Connection error: {0}")]
    Connection(String),
    /// A model operation ran before the connection was established.
    /// The argument is the collection name.
    #[error("Not connected: collection {0} was used before connect()")]
    NotConnected(String),
    /// The identifier string could not be parsed into a native document id.
    #[error("Invalid document id: {0:?}")]
    InvalidId(String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} not found in collection {1}")]
    DocumentNotFound(String, String),
    /// The store did not acknowledge an insert, or echoed back an unexpected shape.
    /// The first argument is the collection name, the second describes the problem.
    #[error("Insert into collection {0} failed: {1}")]
    Insert(String, String),
    /// Client-supplied fields have no representation in the store,
    /// such as an integer above `i64::MAX`.
    #[error("Invalid fields: {0}")]
    InvalidFields(String),
    /// A document returned by the store has an invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The store acknowledged an operation in a way that should be impossible,
    /// such as a single-document delete removing several documents.
    #[error("Acknowledgement invariant violated: {0}")]
    InvariantViolation(String),
    /// An error occurred in the underlying storage backend, including timeouts.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
