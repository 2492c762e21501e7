//! Repository layer for persisting the kernel `Store` to SQLite
//!
//! `sqlite_repo` writes rows and change journals, `hydration` reads them back.

pub mod hydration;
pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;

use crate::errors::{invalid_timestamp, Result};
use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn from_micros(column: &str, micros: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_micros(micros)
        .single()
        .ok_or_else(|| invalid_timestamp(column, micros))
}

pub(crate) fn from_micros_opt(column: &str, micros: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    micros.map(|m| from_micros(column, m)).transpose()
}
