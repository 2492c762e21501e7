//! Durable secret storage on the `settings` table

use chrono::Utc;
use quire_core::errors::{QuireError, Result};
use quire_core::signing::SecretStore;
use rusqlite::{Connection, OptionalExtension};

/// `SecretStore` backed by the settings table
///
/// Values survive restarts, so preview links stay valid until the secret
/// is rotated.
pub struct SqliteSecretStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteSecretStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

fn secret_store_error(err: rusqlite::Error) -> QuireError {
    QuireError::SecretStore {
        reason: err.to_string(),
    }
}

impl SecretStore for SqliteSecretStore<'_> {
    fn get(&self, name: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM settings WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()
            .map_err(secret_store_error)
    }

    fn put(&self, name: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO settings (name, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at",
                rusqlite::params![name, value, Utc::now().timestamp()],
            )
            .map_err(secret_store_error)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE name = ?", [name])
            .map_err(secret_store_error)?;
        Ok(())
    }
}
