//! MongoDB backend implementation for aviary.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! persisting documents through the official async driver.
//!
//! To use this backend, keep the default `mongodb` feature of the `aviary` crate
//! enabled and configure a `mongodb://` or `mongodb+srv://` address.
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Eager connect** - The builder pings the server, so bad addresses fail at connect time
//! - **Field name escaping** - Keys containing `.` or `$` are stored safely and restored on read
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use aviary_core::connection::ConnectionManager;
//! use aviary_mongodb::MongoDbStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = ConnectionManager::new(
//!         MongoDbStore::builder("mongodb://localhost:27017/aviary"),
//!     );
//!     connection.connect().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod store;
pub mod sanitizer;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
