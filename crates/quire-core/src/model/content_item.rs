use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::EntityId;
use super::placeholder::PlaceholderId;

/// Store-assigned content item identifier
pub type ContentItemId = u64;

/// A content block rendered inside a placeholder
///
/// `plugin` names the content-block type (e.g. "rawhtml"); `payload` is the
/// plugin-owned content. The kernel never interprets the payload, it only
/// asks the content cloner to copy it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentItemId,
    pub parent_id: EntityId,
    pub placeholder_id: Option<PlaceholderId>,
    pub sort_order: u32,
    pub plugin: String,
    pub payload: Value,
}

impl ContentItem {
    /// Create an unsaved item; the store assigns the id on insert
    pub fn new(
        parent_id: EntityId,
        placeholder_id: Option<PlaceholderId>,
        plugin: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: 0,
            parent_id,
            placeholder_id,
            sort_order: 0,
            plugin: plugin.into(),
            payload,
        }
    }

    /// Convenience accessor for string payload keys (e.g. "html")
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}
