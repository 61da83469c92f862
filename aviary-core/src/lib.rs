//! The data-access layer of aviary: a thin model abstraction over a document store.
//!
//! This crate provides:
//!
//! - **Documents** ([`document`]) - Schema-less documents, identifiers and BSON/JSON conversion
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Connection management** ([`connection`]) - The single, lazily established store connection
//! - **Models** ([`model`]) - Collection-bound insert/find/update/delete operations
//! - **Error handling** ([`error`]) - The error taxonomy shared by every layer
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use aviary_core::{connection::ConnectionManager, model::Model};
//! use aviary_memory::InMemoryStoreBuilder;
//!
//! let connection = Arc::new(ConnectionManager::new(InMemoryStoreBuilder::default()));
//! let birds = Model::new(Arc::clone(&connection), "birds");
//!
//! connection.connect().await?;
//! let robin = birds.insert_one(fields).await?;
//! ```

pub mod backend;
pub mod connection;
pub mod document;
pub mod error;
pub mod model;
