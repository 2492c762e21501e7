//! SQLite repository implementation
//!
//! Persists entities, placeholders and content items from the kernel Store.
//! Every function takes a `&Connection`; pass a `&Transaction` (it derefs to
//! one) to group writes.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, from_serde_json, Result};
use crate::repo::to_micros;
use quire_core::model::{ContentItem, ContentItemId, EntityId, Placeholder, PlaceholderId, VersionedEntity};
use quire_core::ops::{ChangeSet, Sequences, Store};
use rusqlite::Connection;

/// SQLite repository for the publishing kernel
pub struct SqliteRepo;

impl SqliteRepo {
    /// Insert or update an entity row
    pub fn persist_entity(conn: &Connection, entity: &VersionedEntity) -> Result<()> {
        let fields = serde_json::to_string(&entity.content.fields)
            .map_err(|e| from_serde_json("fields", e))?;

        conn.execute(
            "INSERT INTO entities (id, title, slug, fields, publication_date, publication_end_date,
                                   is_draft, linked_id, published_at, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                slug = excluded.slug,
                fields = excluded.fields,
                publication_date = excluded.publication_date,
                publication_end_date = excluded.publication_end_date,
                linked_id = excluded.linked_id,
                published_at = excluded.published_at,
                modified_at = excluded.modified_at",
            rusqlite::params![
                entity.id,
                entity.title(),
                entity.slug(),
                fields,
                entity.content.publication_date.map(to_micros),
                entity.content.publication_end_date.map(to_micros),
                if entity.is_draft() { 1 } else { 0 },
                entity.linked_id(),
                entity.published_at().map(to_micros),
                to_micros(entity.created_at()),
                to_micros(entity.modified_at()),
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Insert or update a placeholder row
    pub fn persist_placeholder(conn: &Connection, placeholder: &Placeholder) -> Result<()> {
        conn.execute(
            "INSERT INTO placeholders (id, parent_id, slot, role, title)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                slot = excluded.slot,
                role = excluded.role,
                title = excluded.title",
            rusqlite::params![
                placeholder.id,
                placeholder.parent_id,
                placeholder.slot,
                placeholder.role,
                placeholder.title,
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    /// Insert or update a content item row
    pub fn persist_item(conn: &Connection, item: &ContentItem) -> Result<()> {
        conn.execute(
            "INSERT INTO content_items (id, parent_id, placeholder_id, sort_order, plugin, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                placeholder_id = excluded.placeholder_id,
                sort_order = excluded.sort_order,
                plugin = excluded.plugin,
                payload = excluded.payload",
            rusqlite::params![
                item.id,
                item.parent_id,
                item.placeholder_id,
                item.sort_order,
                item.plugin,
                item.payload,
            ],
        )
        .map_err(from_rusqlite)?;

        Ok(())
    }

    pub fn delete_entity(conn: &Connection, id: EntityId) -> Result<()> {
        conn.execute("DELETE FROM entities WHERE id = ?", [id])
            .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn delete_placeholder(conn: &Connection, id: PlaceholderId) -> Result<()> {
        conn.execute("DELETE FROM placeholders WHERE id = ?", [id])
            .map_err(from_rusqlite)?;
        Ok(())
    }

    pub fn delete_item(conn: &Connection, id: ContentItemId) -> Result<()> {
        conn.execute("DELETE FROM content_items WHERE id = ?", [id])
            .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Record the id high-water marks so deleted ids are never reused
    pub fn persist_sequences(conn: &Connection, sequences: Sequences) -> Result<()> {
        for (name, value) in [
            ("entities", sequences.entities),
            ("placeholders", sequences.placeholders),
            ("content_items", sequences.items),
        ] {
            conn.execute(
                "INSERT INTO sequences (name, value) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET value = MAX(value, excluded.value)",
                rusqlite::params![name, value],
            )
            .map_err(from_rusqlite)?;
        }
        Ok(())
    }

    /// Write one command's change journal
    ///
    /// Deletes run first (children before parents), then upserts (parents
    /// before children). Ids journaled as upserted but no longer in the
    /// store are skipped. Callers wrap this in a transaction.
    pub fn persist_changes(conn: &Connection, store: &Store, changes: &ChangeSet) -> Result<()> {
        for id in &changes.removed_items {
            Self::delete_item(conn, *id)?;
        }
        for id in &changes.removed_placeholders {
            Self::delete_placeholder(conn, *id)?;
        }
        for id in &changes.removed_entities {
            Self::delete_entity(conn, *id)?;
        }

        for id in &changes.upserted_entities {
            if let Ok(entity) = store.get_entity(*id) {
                Self::persist_entity(conn, entity)?;
            }
        }
        for id in &changes.upserted_placeholders {
            if let Ok(placeholder) = store.get_placeholder(*id) {
                Self::persist_placeholder(conn, placeholder)?;
            }
        }
        for id in &changes.upserted_items {
            if let Ok(item) = store.get_item(*id) {
                Self::persist_item(conn, item)?;
            }
        }

        Self::persist_sequences(conn, store.sequences())?;

        tracing::debug!(
            upserted_entities = changes.upserted_entities.len() as u64,
            removed_entities = changes.removed_entities.len() as u64,
            upserted_items = changes.upserted_items.len() as u64,
            removed_items = changes.removed_items.len() as u64,
            "persisted change set"
        );
        Ok(())
    }

    /// Write every row of a store (initial import)
    ///
    /// A draft row links to a published row with a higher id, so the
    /// deferred `linked_id` check only passes at commit. On an autocommit
    /// connection the import runs in its own transaction; otherwise it joins
    /// the caller's.
    pub fn persist_store(conn: &Connection, store: &Store) -> Result<()> {
        if !conn.is_autocommit() {
            return Self::persist_store_rows(conn, store);
        }
        let tx = conn.unchecked_transaction().map_err(from_rusqlite)?;
        Self::persist_store_rows(&tx, store)?;
        tx.commit().map_err(from_rusqlite)
    }

    fn persist_store_rows(conn: &Connection, store: &Store) -> Result<()> {
        let ids = store.entity_ids();
        for id in &ids {
            Self::persist_entity(conn, store.get_entity(*id)?)?;
        }
        for id in &ids {
            for placeholder in store.placeholders_for(*id) {
                Self::persist_placeholder(conn, placeholder)?;
            }
            for item in store.items_for(*id) {
                Self::persist_item(conn, item)?;
            }
        }
        Self::persist_sequences(conn, store.sequences())
    }
}
