//! HTTP service exposing CRUD operations over the `birds` collection.
//!
//! Requests flow through [`middleware::handle_errors`], which turns every failure into
//! a structured [`error::ErrorEnvelope`], into the handlers in [`routes`]. Handlers
//! work through the [`db::Database`] context: one lazily established connection
//! shared by every model.
//!
//! The store is chosen by the configured address: `memory://` for the in-memory
//! store, `mongodb://` or `mongodb+srv://` for MongoDB (the `mongodb` feature, on by
//! default).
//!
//! ```ignore
//! use aviary::{config::Config, db::Database, server};
//!
//! let mut config = Config::default();
//! config.db.url = "memory://".to_string();
//!
//! let db = Database::from_config(&config.db)?;
//! server::serve(&config, db).await?;
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod telemetry;
