//! Hydration layer - loads the database into a kernel Store
//!
//! Rows are read in id order so a reload is deterministic.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, from_serde_json, Result};
use crate::repo::{from_micros, from_micros_opt};
use quire_core::model::{ContentItem, EntityContent, Placeholder, VersionedEntity, VersioningState};
use quire_core::ops::{Sequences, Store};
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Raw entity row before timestamp and JSON decoding
struct EntityRow {
    id: u64,
    title: String,
    slug: String,
    fields: String,
    publication_date: Option<i64>,
    publication_end_date: Option<i64>,
    is_draft: i32,
    linked_id: Option<u64>,
    published_at: Option<i64>,
    created_at: i64,
    modified_at: i64,
}

impl EntityRow {
    fn into_entity(self) -> Result<VersionedEntity> {
        let fields: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&self.fields).map_err(|e| from_serde_json("fields", e))?;

        let content = EntityContent {
            title: self.title,
            slug: self.slug,
            fields,
            publication_date: from_micros_opt("publication_date", self.publication_date)?,
            publication_end_date: from_micros_opt(
                "publication_end_date",
                self.publication_end_date,
            )?,
        };
        let state = VersioningState {
            is_draft: self.is_draft != 0,
            linked_id: self.linked_id,
            published_at: from_micros_opt("published_at", self.published_at)?,
            created_at: from_micros("created_at", self.created_at)?,
            modified_at: from_micros("modified_at", self.modified_at)?,
        };
        Ok(VersionedEntity::from_parts(self.id, content, state))
    }
}

/// Load every entity into the Store
pub fn load_all_entities(conn: &Connection, store: &mut Store) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "SELECT id, title, slug, fields, publication_date, publication_end_date,
                    is_draft, linked_id, published_at, created_at, modified_at
             FROM entities ORDER BY id",
        )
        .map_err(from_rusqlite)?;

    let rows = stmt
        .query_map([], |row| {
            Ok(EntityRow {
                id: row.get(0)?,
                title: row.get(1)?,
                slug: row.get(2)?,
                fields: row.get(3)?,
                publication_date: row.get(4)?,
                publication_end_date: row.get(5)?,
                is_draft: row.get(6)?,
                linked_id: row.get(7)?,
                published_at: row.get(8)?,
                created_at: row.get(9)?,
                modified_at: row.get(10)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    for row in rows {
        store.restore_entity(row.into_entity()?);
    }

    Ok(())
}

/// Load every placeholder into the Store
pub fn load_all_placeholders(conn: &Connection, store: &mut Store) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT id, parent_id, slot, role, title FROM placeholders ORDER BY id")
        .map_err(from_rusqlite)?;

    let placeholders: Vec<Placeholder> = stmt
        .query_map([], |row| {
            Ok(Placeholder {
                id: row.get(0)?,
                parent_id: row.get(1)?,
                slot: row.get(2)?,
                role: row.get(3)?,
                title: row.get(4)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    for placeholder in placeholders {
        store.restore_placeholder(placeholder);
    }

    Ok(())
}

/// Load every content item into the Store
pub fn load_all_items(conn: &Connection, store: &mut Store) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "SELECT id, parent_id, placeholder_id, sort_order, plugin, payload
             FROM content_items ORDER BY id",
        )
        .map_err(from_rusqlite)?;

    let items: Vec<ContentItem> = stmt
        .query_map([], |row| {
            Ok(ContentItem {
                id: row.get(0)?,
                parent_id: row.get(1)?,
                placeholder_id: row.get(2)?,
                sort_order: row.get(3)?,
                plugin: row.get(4)?,
                payload: row.get(5)?,
            })
        })
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    for item in items {
        store.restore_item(item);
    }

    Ok(())
}

/// Read the persisted id high-water marks
pub fn load_sequences(conn: &Connection) -> Result<Sequences> {
    let mut stmt = conn
        .prepare("SELECT name, value FROM sequences")
        .map_err(from_rusqlite)?;

    let rows: Vec<(String, u64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;

    let mut sequences = Sequences::default();
    for (name, value) in rows {
        match name.as_str() {
            "entities" => sequences.entities = value,
            "placeholders" => sequences.placeholders = value,
            "content_items" => sequences.items = value,
            other => tracing::warn!(sequence = other, "ignoring unknown sequence row"),
        }
    }
    Ok(sequences)
}

/// Load the whole database into a fresh Store
///
/// The returned store has an empty change journal.
pub fn load_store(conn: &Connection) -> Result<Store> {
    let mut store = Store::new();
    load_all_entities(conn, &mut store)?;
    load_all_placeholders(conn, &mut store)?;
    load_all_items(conn, &mut store)?;
    store.restore_sequences(load_sequences(conn)?);
    Ok(store)
}
