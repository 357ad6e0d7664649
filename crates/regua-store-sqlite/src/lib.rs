//! SQLite backend for the Régua schedule store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Foreign keys carry the cascade and
//! set-null rules of the data model; every write runs in one transaction.

mod encode;
mod migrate;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
