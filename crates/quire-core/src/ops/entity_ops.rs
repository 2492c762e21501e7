use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::store::Store;
use crate::errors::{QuireError, Result};
use crate::model::{EntityContent, EntityId, VersionedEntity};

/// Partial update of an entity's content
///
/// `None` leaves a value untouched. The publication bounds are doubly
/// optional so that a bound can be cleared with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    /// Fields to set; a JSON null removes the field
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    pub publication_date: Option<Option<DateTime<Utc>>>,
    pub publication_end_date: Option<Option<DateTime<Utc>>>,
}

impl EntityPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Create a new draft entity
///
/// # Returns
/// The id assigned by the store
///
/// # Errors
/// * `InvalidTitle` / `InvalidSlug` / `InvalidPublicationWindow` - content rejected
pub fn create_entity(store: &mut Store, content: EntityContent) -> Result<EntityId> {
    content.validate()?;
    let now = store.stamp();
    Ok(store.insert_entity(VersionedEntity::new_draft(content, now)))
}

/// Read an entity by ID
///
/// # Errors
/// * `EntityNotFound` - If the entity doesn't exist
pub fn read_entity(store: &Store, id: EntityId) -> Result<&VersionedEntity> {
    store.get_entity(id)
}

/// Apply a patch to a draft's content and bump its `modified_at`
///
/// # Errors
/// * `EntityNotFound` - If the entity doesn't exist
/// * `NotDraft` - If called on a published copy
/// * `InvalidTitle` / `InvalidSlug` / `InvalidPublicationWindow` - patched content rejected
pub fn update_entity(store: &mut Store, id: EntityId, patch: EntityPatch) -> Result<()> {
    let entity = store.get_entity(id)?;
    assert_draft(entity)?;

    let mut content = entity.content.clone();
    if let Some(title) = patch.title {
        content.title = title;
    }
    if let Some(slug) = patch.slug {
        content.slug = slug;
    }
    for (name, value) in patch.fields {
        if value.is_null() {
            content.fields.remove(&name);
        } else {
            content.fields.insert(name, value);
        }
    }
    if let Some(start) = patch.publication_date {
        content.publication_date = start;
    }
    if let Some(end) = patch.publication_end_date {
        content.publication_end_date = end;
    }
    content.validate()?;

    let now = store.stamp();
    let entity = store.get_entity_mut(id)?;
    entity.content = content;
    entity.modified_at = now;
    Ok(())
}

/// Delete a draft together with its published counterpart
///
/// Placeholders and content items of both copies are removed as well.
///
/// # Returns
/// The ids of every entity removed (draft first)
///
/// # Errors
/// * `EntityNotFound` - If the entity doesn't exist
/// * `NotDraft` - If called on a published copy
pub fn delete_entity(store: &mut Store, id: EntityId) -> Result<Vec<EntityId>> {
    let entity = store.get_entity(id)?;
    assert_draft(entity)?;

    let mut removed = vec![id];
    if let Some(published_id) = entity.linked_id {
        removed.push(published_id);
    }

    for entity_id in &removed {
        store.remove_children(*entity_id);
        store.remove_entity(*entity_id);
    }
    Ok(removed)
}

/// Reject mutations aimed at a published copy
///
/// # Errors
/// * `NotDraft` - If the entity is not a draft
pub fn assert_draft(entity: &VersionedEntity) -> Result<()> {
    if entity.is_draft {
        Ok(())
    } else {
        Err(QuireError::NotDraft {
            entity_id: entity.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_entity_starts_as_draft() {
        let mut store = Store::new();
        let id = create_entity(&mut store, EntityContent::new("Hello, world!", "hello")).unwrap();
        let entity = read_entity(&store, id).unwrap();
        assert!(entity.is_draft());
        assert_eq!(entity.published_at(), None);
    }

    #[test]
    fn test_create_entity_rejects_empty_title() {
        let mut store = Store::new();
        let result = create_entity(&mut store, EntityContent::new("", "hello"));
        assert!(matches!(result, Err(QuireError::InvalidTitle { .. })));
        assert!(store.list_entities().is_empty());
    }

    #[test]
    fn test_update_bumps_modified_at() {
        let mut store = Store::new();
        let id = create_entity(&mut store, EntityContent::new("Hello", "hello")).unwrap();
        let before = read_entity(&store, id).unwrap().modified_at();

        update_entity(&mut store, id, EntityPatch::title("Hello v2")).unwrap();

        let entity = read_entity(&store, id).unwrap();
        assert_eq!(entity.title(), "Hello v2");
        assert!(entity.modified_at() > before);
    }

    #[test]
    fn test_update_null_field_removes_it() {
        let mut store = Store::new();
        let content = EntityContent::new("Hello", "hello").with_field("lead", json!("intro"));
        let id = create_entity(&mut store, content).unwrap();

        let mut patch = EntityPatch::default();
        patch.fields.insert("lead".to_string(), Value::Null);
        update_entity(&mut store, id, patch).unwrap();

        assert_eq!(read_entity(&store, id).unwrap().field_value("lead"), None);
    }

    #[test]
    fn test_invalid_patch_leaves_entity_untouched() {
        let mut store = Store::new();
        let id = create_entity(&mut store, EntityContent::new("Hello", "hello")).unwrap();
        let result = update_entity(&mut store, id, EntityPatch::title("  "));
        assert!(result.is_err());
        assert_eq!(read_entity(&store, id).unwrap().title(), "Hello");
    }
}
