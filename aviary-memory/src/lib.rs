//! In-memory document storage backend for aviary.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development,
//! testing, and small deployments. Select it in the server with a `memory://` address.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use aviary_core::{connection::ConnectionManager, model::Model};
//! use aviary_memory::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Arc::new(ConnectionManager::new(InMemoryStore::builder()));
//!     let birds = Model::new(Arc::clone(&connection), "birds");
//!
//!     connection.connect().await?;
//!     birds.insert_one(serde_json::Map::new()).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
