//! SQLite storage backend for Vitrine
//!
//! Implements `vitrine-core`'s storage abstractions over a single SQLite
//! database: the image blobs and the case-study rows share one file, so one
//! database transaction is the all-or-nothing unit of work the
//! synchronization engine requires.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vitrine_sqlite::{create_sync_engine, SqliteConfig, SqlitePool};
//!
//! let pool = SqlitePool::new(SqliteConfig::new("./vitrine.db"))?;
//! let engine = create_sync_engine(pool);
//!
//! let created = engine.create(&upload)?;
//! let served = engine.serve(created.id, "https://folio.example.com")?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod schema;
pub mod store;

// Re-exports
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use error::{SqliteError, SqliteResult};
pub use store::{create_sync_engine, SqliteStore};
