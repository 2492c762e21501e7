use serde_json::Value;

use super::entity_ops::assert_draft;
use super::store::Store;
use crate::errors::Result;
use crate::model::{
    ContentItem, ContentItemId, EntityId, Placeholder, PlaceholderId,
};

/// Add a placeholder slot to a draft
///
/// # Errors
/// * `EntityNotFound` - If the parent doesn't exist
/// * `NotDraft` - If the parent is a published copy
pub fn create_placeholder(
    store: &mut Store,
    parent_id: EntityId,
    slot: &str,
    role: Option<String>,
    title: Option<String>,
) -> Result<PlaceholderId> {
    assert_draft(store.get_entity(parent_id)?)?;

    let mut placeholder = Placeholder::new(parent_id, slot);
    if let Some(role) = role {
        placeholder = placeholder.with_role(role);
    }
    if let Some(title) = title {
        placeholder = placeholder.with_title(title);
    }

    let id = store.insert_placeholder(placeholder);
    store.touch_entity(parent_id)?;
    Ok(id)
}

/// Update a placeholder's title and/or role
///
/// # Errors
/// * `PlaceholderNotFound` - If the placeholder doesn't exist
/// * `NotDraft` - If the owning entity is a published copy
pub fn update_placeholder(
    store: &mut Store,
    placeholder_id: PlaceholderId,
    title: Option<String>,
    role: Option<String>,
) -> Result<()> {
    let parent_id = store.get_placeholder(placeholder_id)?.parent_id;
    assert_draft(store.get_entity(parent_id)?)?;

    let placeholder = store.get_placeholder_mut(placeholder_id)?;
    if let Some(title) = title {
        placeholder.title = title;
    }
    if let Some(role) = role {
        placeholder.role = role;
    }
    store.touch_entity(parent_id)
}

/// Append a content item to the first placeholder in `slot`
///
/// Creates the placeholder if the entity has none for that slot yet.
///
/// # Returns
/// The id of the new content item
///
/// # Errors
/// * `EntityNotFound` - If the parent doesn't exist
/// * `NotDraft` - If the parent is a published copy
pub fn create_content_instance(
    store: &mut Store,
    parent_id: EntityId,
    slot: &str,
    plugin: &str,
    payload: Value,
) -> Result<ContentItemId> {
    assert_draft(store.get_entity(parent_id)?)?;

    let existing = store
        .placeholders_for(parent_id)
        .into_iter()
        .find(|p| p.slot == slot)
        .map(|p| p.id);
    let placeholder_id = match existing {
        Some(id) => id,
        None => store.insert_placeholder(Placeholder::new(parent_id, slot)),
    };

    let sort_order = store
        .items_in_placeholder(placeholder_id)
        .last()
        .map_or(0, |i| i.sort_order + 1);
    let mut item = ContentItem::new(parent_id, Some(placeholder_id), plugin, payload);
    item.sort_order = sort_order;

    let id = store.insert_item(item);
    store.touch_entity(parent_id)?;
    Ok(id)
}

/// Replace a content item's payload
///
/// # Errors
/// * `ContentItemNotFound` - If the item doesn't exist
/// * `NotDraft` - If the owning entity is a published copy
pub fn update_content_item(store: &mut Store, item_id: ContentItemId, payload: Value) -> Result<()> {
    let parent_id = store.get_item(item_id)?.parent_id;
    assert_draft(store.get_entity(parent_id)?)?;

    store.get_item_mut(item_id)?.payload = payload;
    store.touch_entity(parent_id)
}

/// Remove a content item from a draft
///
/// # Errors
/// * `ContentItemNotFound` - If the item doesn't exist
/// * `NotDraft` - If the owning entity is a published copy
pub fn delete_content_item(store: &mut Store, item_id: ContentItemId) -> Result<()> {
    let parent_id = store.get_item(item_id)?.parent_id;
    assert_draft(store.get_entity(parent_id)?)?;

    store.remove_item(item_id);
    store.touch_entity(parent_id)
}
