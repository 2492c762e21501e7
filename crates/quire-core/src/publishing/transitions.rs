use std::collections::BTreeMap;
use std::time::Instant;

use crate::errors::{QuireError, Result};
use crate::model::{EntityId, Placeholder, PlaceholderId, VersionedEntity};
use crate::ops::entity_ops::assert_draft;
use crate::ops::Store;
use crate::policy::ContentCloner;
use crate::{log_op_end, log_op_error, log_op_start};

/// What a successful publish produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOutcome {
    pub draft_id: EntityId,
    pub published_id: EntityId,
    /// False when an existing published copy was updated in place
    pub created: bool,
    pub cloned_placeholders: usize,
    pub cloned_items: usize,
}

/// Publish a draft
///
/// Creates the published counterpart, or updates the existing one in place,
/// then replaces its placeholders and content items with fresh clones of the
/// draft's. Both copies are linked to each other and `published_at` is set.
/// The published copy's `modified_at` is the publish time, so the draft is
/// clean afterwards.
///
/// All writes happen in one store transaction.
///
/// # Errors
///
/// * `EntityNotFound` - If the entity doesn't exist
/// * `NotDraft` - If called on a published copy
/// * `TransactionFailed` - If any write or clone fails; nothing is changed
pub fn publish(
    store: &mut Store,
    draft_id: EntityId,
    cloner: &dyn ContentCloner,
) -> Result<PublishOutcome> {
    log_op_start!("publish", entity_id = draft_id);
    let start = Instant::now();

    let result = publish_impl(store, draft_id, cloner);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(outcome) => log_op_end!(
            "publish",
            duration_ms = duration_ms,
            entity_id = draft_id,
            published_id = outcome.published_id,
            cloned_placeholders = outcome.cloned_placeholders as u64,
            cloned_items = outcome.cloned_items as u64
        ),
        Err(err) => log_op_error!(
            "publish",
            err.clone(),
            duration_ms = duration_ms,
            entity_id = draft_id
        ),
    }
    result
}

fn publish_impl(
    store: &mut Store,
    draft_id: EntityId,
    cloner: &dyn ContentCloner,
) -> Result<PublishOutcome> {
    assert_draft(store.get_entity(draft_id)?)?;

    store
        .transaction(|tx| copy_to_published(tx, draft_id, cloner))
        .map_err(|err| QuireError::TransactionFailed {
            op: "publish".to_string(),
            reason: err.to_string(),
        })
}

fn copy_to_published(
    tx: &mut Store,
    draft_id: EntityId,
    cloner: &dyn ContentCloner,
) -> Result<PublishOutcome> {
    let draft = tx.get_entity(draft_id)?.clone();
    let now = tx.stamp();

    let existing = draft
        .linked_id
        .filter(|id| tx.get_entity(*id).is_ok());
    let (published_id, created) = match existing {
        Some(published_id) => {
            let published = tx.get_entity_mut(published_id)?;
            published.content = draft.content.clone();
            published.published_at = Some(now);
            published.modified_at = now;
            (published_id, false)
        }
        None => {
            let published = VersionedEntity {
                id: 0,
                content: draft.content.clone(),
                is_draft: false,
                linked_id: Some(draft_id),
                published_at: Some(now),
                created_at: now,
                modified_at: now,
            };
            (tx.insert_entity(published), true)
        }
    };

    // The draft's modified_at stays put: linking is not an edit.
    let draft_mut = tx.get_entity_mut(draft_id)?;
    draft_mut.linked_id = Some(published_id);
    draft_mut.published_at = Some(now);

    tx.remove_children(published_id);

    let placeholders: Vec<Placeholder> = tx.placeholders_for(draft_id).into_iter().cloned().collect();
    let mut placeholder_map: BTreeMap<PlaceholderId, PlaceholderId> = BTreeMap::new();
    for placeholder in &placeholders {
        let clone = Placeholder {
            id: 0,
            parent_id: published_id,
            ..placeholder.clone()
        };
        placeholder_map.insert(placeholder.id, tx.insert_placeholder(clone));
    }

    let items: Vec<_> = tx.items_for(draft_id).into_iter().cloned().collect();
    for item in &items {
        let new_placeholder = match item.placeholder_id {
            Some(old) => Some(*placeholder_map.get(&old).ok_or(
                QuireError::PlaceholderNotFound {
                    placeholder_id: old,
                },
            )?),
            None => None,
        };
        let mut clone = cloner.clone_item(item, published_id, new_placeholder)?;
        clone.parent_id = published_id;
        clone.placeholder_id = new_placeholder;
        tx.insert_item(clone);
    }

    Ok(PublishOutcome {
        draft_id,
        published_id,
        created,
        cloned_placeholders: placeholders.len(),
        cloned_items: items.len(),
    })
}

/// Retract a draft's published counterpart
///
/// Deletes the published copy with its placeholders and items and clears
/// the draft's link and `published_at`. A draft that was never published is
/// left as is.
///
/// # Returns
/// The id of the removed published copy, if there was one
///
/// # Errors
///
/// * `EntityNotFound` - If the entity doesn't exist
/// * `NotDraft` - If called on a published copy
/// * `TransactionFailed` - If a write fails; nothing is changed
pub fn unpublish(store: &mut Store, draft_id: EntityId) -> Result<Option<EntityId>> {
    log_op_start!("unpublish", entity_id = draft_id);
    let start = Instant::now();

    let result = unpublish_impl(store, draft_id);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(removed) => log_op_end!(
            "unpublish",
            duration_ms = duration_ms,
            entity_id = draft_id,
            published_id = ?removed
        ),
        Err(err) => log_op_error!(
            "unpublish",
            err.clone(),
            duration_ms = duration_ms,
            entity_id = draft_id
        ),
    }
    result
}

fn unpublish_impl(store: &mut Store, draft_id: EntityId) -> Result<Option<EntityId>> {
    let draft = store.get_entity(draft_id)?;
    assert_draft(draft)?;

    let Some(published_id) = draft.linked_id else {
        return Ok(None);
    };

    store
        .transaction(|tx| {
            tx.remove_children(published_id);
            tx.remove_entity(published_id);
            let draft = tx.get_entity_mut(draft_id)?;
            draft.linked_id = None;
            draft.published_at = None;
            Ok(Some(published_id))
        })
        .map_err(|err| QuireError::TransactionFailed {
            op: "unpublish".to_string(),
            reason: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityContent;
    use crate::ops::{content_ops, entity_ops};
    use crate::policy::PluginContentCloner;
    use serde_json::json;

    fn draft(store: &mut Store) -> EntityId {
        entity_ops::create_entity(store, EntityContent::new("Hello, world!", "hello")).unwrap()
    }

    #[test]
    fn test_publish_links_both_sides() {
        let mut store = Store::new();
        let id = draft(&mut store);

        let outcome = publish(&mut store, id, &PluginContentCloner).unwrap();

        let draft = store.get_entity(id).unwrap();
        let published = store.get_entity(outcome.published_id).unwrap();
        assert!(outcome.created);
        assert_eq!(draft.linked_id(), Some(published.id));
        assert_eq!(published.linked_id(), Some(draft.id));
        assert!(!published.is_draft());
        assert!(published.published_at().is_some());
    }

    #[test]
    fn test_publish_on_published_copy_fails() {
        let mut store = Store::new();
        let id = draft(&mut store);
        let outcome = publish(&mut store, id, &PluginContentCloner).unwrap();

        let result = publish(&mut store, outcome.published_id, &PluginContentCloner);
        assert!(matches!(result, Err(QuireError::NotDraft { .. })));
    }

    #[test]
    fn test_republish_replaces_children() {
        let mut store = Store::new();
        let id = draft(&mut store);
        content_ops::create_content_instance(&mut store, id, "main", "text", json!({"t": 1})).unwrap();
        let first = publish(&mut store, id, &PluginContentCloner).unwrap();

        content_ops::create_content_instance(&mut store, id, "main", "text", json!({"t": 2})).unwrap();
        let second = publish(&mut store, id, &PluginContentCloner).unwrap();

        assert_eq!(first.published_id, second.published_id);
        assert!(!second.created);
        assert_eq!(store.items_for(second.published_id).len(), 2);
        assert_eq!(store.placeholders_for(second.published_id).len(), 1);
    }

    #[test]
    fn test_unpublish_never_published_is_noop() {
        let mut store = Store::new();
        let id = draft(&mut store);
        assert_eq!(unpublish(&mut store, id).unwrap(), None);
        assert_eq!(store.list_entities().len(), 1);
    }

    #[test]
    fn test_unpublish_on_published_copy_fails() {
        let mut store = Store::new();
        let id = draft(&mut store);
        let outcome = publish(&mut store, id, &PluginContentCloner).unwrap();

        let result = unpublish(&mut store, outcome.published_id);
        assert!(matches!(result, Err(QuireError::NotDraft { .. })));
    }
}
