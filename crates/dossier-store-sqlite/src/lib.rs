//! SQLite backend for Dossier cases and progressions.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The per-command sandboxes built by
//! `dossier-engine` are separate in-memory databases and never touch this one.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
