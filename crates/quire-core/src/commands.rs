//! Command types for every kernel mutation
//!
//! Commands are processed by `apply()`, which takes ownership of the current
//! state, executes the command and returns the new state with an outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ContentItemId, EntityContent, EntityId, PlaceholderId};
use crate::ops::entity_ops::EntityPatch;
use crate::publishing::PublishOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Create a new draft
    EntityCreate { content: EntityContent },

    /// Patch a draft's content
    EntityUpdate { entity_id: EntityId, patch: EntityPatch },

    /// Delete a draft, its published copy and all children
    EntityDelete { entity_id: EntityId },

    /// Add a placeholder slot to a draft
    PlaceholderCreate {
        entity_id: EntityId,
        slot: String,
        role: Option<String>,
        title: Option<String>,
    },

    PlaceholderUpdate {
        placeholder_id: PlaceholderId,
        title: Option<String>,
        role: Option<String>,
    },

    /// Append a content item to a slot, creating the placeholder if needed
    ContentItemCreate {
        entity_id: EntityId,
        slot: String,
        plugin: String,
        payload: Value,
    },

    ContentItemUpdate { item_id: ContentItemId, payload: Value },

    ContentItemDelete { item_id: ContentItemId },

    Publish { entity_id: EntityId },

    Unpublish { entity_id: EntityId },
}

/// What a successfully applied command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    EntityCreated(EntityId),
    EntityUpdated(EntityId),
    /// Every removed entity, draft first
    EntityDeleted(Vec<EntityId>),
    PlaceholderCreated(PlaceholderId),
    PlaceholderUpdated(PlaceholderId),
    ContentItemCreated(ContentItemId),
    ContentItemUpdated(ContentItemId),
    ContentItemDeleted(ContentItemId),
    Published(PublishOutcome),
    /// The removed published copy, if there was one
    Unpublished(Option<EntityId>),
}
