//! Error handling for quire-store
//!
//! Wraps quire-core ExError with store-specific helpers

use quire_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an error for a JSON column that failed to (de)serialize
pub fn from_serde_json(column: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("sqlite_json")
        .with_field(column)
        .with_message(err.to_string())
}

/// Create an error for a stored timestamp outside the representable range
pub fn invalid_timestamp(column: &str, micros: i64) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("hydration")
        .with_field(column)
        .with_message(format!("Invalid timestamp {} in column {}", micros, column))
}
