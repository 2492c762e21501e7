//! Engine-level read-only query surface.
//!
//! `apply_engine_query` hydrates the store from a shared connection and never
//! writes to the database.

#![allow(clippy::result_large_err)]

use chrono::{DateTime, Utc};
use quire_core::model::{EntityId, VersionedEntity};
use quire_core::{DraftContext, Store};
use quire_store::errors::Result;
use quire_store::load_store;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Which copies a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    #[default]
    All,
    Drafts,
    Published,
}

/// Read-only queries supported by the engine.
#[derive(Debug, Clone)]
pub enum EngineQuery {
    /// One entity with its publishing status and content tree.
    EntityGet { entity_id: EntityId },
    /// Entities in id order.
    EntityList { scope: ListScope },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum EngineQueryResult {
    Entity(EntityView),
    EntityList(Vec<EntityView>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: u64,
    pub plugin: String,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceholderView {
    pub slot: String,
    pub title: String,
    pub items: Vec<ItemView>,
}

/// Serializable snapshot of one entity as seen by operators and views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub title: String,
    pub slug: String,
    pub fields: BTreeMap<String, Value>,
    pub is_draft: bool,
    pub is_published: bool,
    pub has_been_published: bool,
    pub is_dirty: bool,
    pub linked_id: Option<EntityId>,
    pub published_at: Option<DateTime<Utc>>,
    pub modified_at: DateTime<Utc>,
    pub publication_date: Option<DateTime<Utc>>,
    pub publication_end_date: Option<DateTime<Utc>>,
    pub placeholders: Vec<PlaceholderView>,
}

impl EntityView {
    pub fn build(entity: &VersionedEntity, store: &Store) -> Self {
        let placeholders = store
            .placeholders_for(entity.id)
            .into_iter()
            .map(|p| PlaceholderView {
                slot: p.slot.clone(),
                title: p.title.clone(),
                items: store
                    .items_in_placeholder(p.id)
                    .into_iter()
                    .map(|item| ItemView {
                        id: item.id,
                        plugin: item.plugin.clone(),
                        payload: item.payload.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            id: entity.id,
            title: entity.title().to_string(),
            slug: entity.slug().to_string(),
            fields: entity.content.fields.clone(),
            is_draft: entity.is_draft(),
            is_published: entity.is_published(),
            has_been_published: entity.has_been_published(),
            is_dirty: entity.is_dirty(store),
            linked_id: entity.linked_id(),
            published_at: entity.published_at(),
            modified_at: entity.modified_at(),
            publication_date: entity.content.publication_date,
            publication_end_date: entity.content.publication_end_date,
            placeholders,
        }
    }
}

/// Run a read-only query.
pub fn apply_engine_query(query: EngineQuery, conn: &Connection) -> Result<EngineQueryResult> {
    let store = load_store(conn)?;

    match query {
        EngineQuery::EntityGet { entity_id } => {
            let entity = store.get_entity(entity_id)?;
            Ok(EngineQueryResult::Entity(EntityView::build(entity, &store)))
        }
        EngineQuery::EntityList { scope } => {
            // Operator listing: no request context, both copies are addressable
            let ctx = DraftContext::new();
            let query = match scope {
                ListScope::All => store.query(&ctx),
                ListScope::Drafts => store.query(&ctx).draft(),
                ListScope::Published => store.query(&ctx).published(),
            };
            let views = query
                .fetch_unguarded()
                .into_iter()
                .map(|e| EntityView::build(e, &store))
                .collect();
            Ok(EngineQueryResult::EntityList(views))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::ops::entity_ops::create_entity;
    use quire_core::{publish, EntityContent, PluginContentCloner};
    use quire_store::SqliteRepo;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        quire_store::migrations::apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_list_scopes() {
        let conn = setup();
        let mut store = Store::new();
        let a = create_entity(&mut store, EntityContent::new("A", "a")).unwrap();
        create_entity(&mut store, EntityContent::new("B", "b")).unwrap();
        publish(&mut store, a, &PluginContentCloner).unwrap();
        SqliteRepo::persist_store(&conn, &store).unwrap();

        let count = |scope| match apply_engine_query(EngineQuery::EntityList { scope }, &conn).unwrap() {
            EngineQueryResult::EntityList(views) => views.len(),
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(count(ListScope::All), 3);
        assert_eq!(count(ListScope::Drafts), 2);
        assert_eq!(count(ListScope::Published), 1);
    }

    #[test]
    fn test_get_missing_entity() {
        let conn = setup();
        let err = apply_engine_query(EngineQuery::EntityGet { entity_id: 9 }, &conn).unwrap_err();
        assert_eq!(err.code(), "ERR_NOT_FOUND");
    }
}
