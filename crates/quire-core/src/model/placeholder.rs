use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// Store-assigned placeholder identifier
pub type PlaceholderId = u64;

/// A named slot on an entity that content items are assigned to
///
/// Placeholders are structurally owned by their entity. Publishing clones
/// them so draft and published trees never share a placeholder row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub id: PlaceholderId,
    pub parent_id: EntityId,
    /// Template slot name, e.g. "main"
    pub slot: String,
    /// Layout role ("m" main, "s" sidebar, "r" related, "l" local)
    pub role: String,
    pub title: String,
}

impl Placeholder {
    /// Create an unsaved placeholder; the store assigns the id on insert
    pub fn new(parent_id: EntityId, slot: impl Into<String>) -> Self {
        let slot = slot.into();
        Self {
            id: 0,
            parent_id,
            title: slot.clone(),
            slot,
            role: "m".to_string(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}
