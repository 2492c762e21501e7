//! Quire Store - SQLite persistence for the publishing kernel
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - Repository layer writing `Store` change journals to SQLite
//! - Hydration of a `Store` from the database
//! - Durable settings table backing the draft preview secret

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod secrets;

// Re-export key types
pub use errors::Result;
pub use repo::{hydration::load_store, SqliteRepo};
pub use secrets::SqliteSecretStore;
