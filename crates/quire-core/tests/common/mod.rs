use quire_core::errors::{QuireError, Result};
use quire_core::model::{ContentItem, EntityId, PlaceholderId};
use quire_core::ops::{content_ops, entity_ops};
use quire_core::{ContentCloner, EntityContent, Store, User};
use serde_json::json;

/// Create a new empty Store for testing
#[allow(dead_code)]
pub fn new_store() -> Store {
    Store::new()
}

/// Create a draft through the regular CRUD path
#[allow(dead_code)]
pub fn create_draft(store: &mut Store, title: &str, slug: &str) -> EntityId {
    entity_ops::create_entity(store, EntityContent::new(title, slug)).unwrap()
}

/// Add the two `rawhtml` items "ping" and "pong" to the "main" slot
#[allow(dead_code)]
pub fn add_ping_pong(store: &mut Store, entity_id: EntityId) {
    for text in ["ping", "pong"] {
        content_ops::create_content_instance(
            store,
            entity_id,
            "main",
            "rawhtml",
            json!({ "html": format!("<b>{}</b>", text) }),
        )
        .unwrap();
    }
}

#[allow(dead_code)]
pub fn staff() -> Option<User> {
    Some(User::staff(1, "staff"))
}

#[allow(dead_code)]
pub fn reviewer() -> Option<User> {
    Some(User::new(2, "reviewer").with_group("Content Reviewers"))
}

#[allow(dead_code)]
pub fn plain_user() -> Option<User> {
    Some(User::new(3, "user"))
}

/// Cloner that refuses items whose payload has `"fail": true`
#[allow(dead_code)]
pub struct FailingCloner;

impl ContentCloner for FailingCloner {
    fn clone_item(
        &self,
        item: &ContentItem,
        new_parent: EntityId,
        new_placeholder: Option<PlaceholderId>,
    ) -> Result<ContentItem> {
        if item.payload.get("fail").and_then(|v| v.as_bool()) == Some(true) {
            return Err(QuireError::CloneFailed {
                item_id: item.id,
                reason: "plugin refused to copy".to_string(),
            });
        }
        quire_core::PluginContentCloner.clone_item(item, new_parent, new_placeholder)
    }
}
