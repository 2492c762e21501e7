//! Collaborator seams for publishing
//!
//! `ContentCloner` stands in for the content-block plugin system and is
//! asked to deep-clone each content item on publish. `VisibilityPolicy`
//! stands in for the authorization layer behind `published_for`.

use crate::config::PublishingConfig;
use crate::errors::Result;
use crate::model::{ContentItem, EntityId, PlaceholderId, User};

/// Deep-clone primitive for content items
///
/// Implementations copy the plugin-owned content and reassign the item to
/// its new parent and placeholder. The returned item's id is ignored: the
/// store assigns a fresh one.
pub trait ContentCloner {
    /// Clone `item` for the published tree
    ///
    /// # Errors
    ///
    /// Returns `CloneFailed` if the plugin cannot copy this item; the
    /// surrounding publish is then rolled back.
    fn clone_item(
        &self,
        item: &ContentItem,
        new_parent: EntityId,
        new_placeholder: Option<PlaceholderId>,
    ) -> Result<ContentItem>;
}

/// Cloner for plugins whose whole content lives in the JSON payload
///
/// # Example
/// ```
/// use quire_core::policy::{ContentCloner, PluginContentCloner};
/// use quire_core::model::ContentItem;
/// use serde_json::json;
///
/// let item = ContentItem::new(1, Some(1), "rawhtml", json!({"html": "<b>ping</b>"}));
/// let clone = PluginContentCloner.clone_item(&item, 2, Some(5)).unwrap();
/// assert_eq!(clone.payload, item.payload);
/// assert_eq!(clone.parent_id, 2);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginContentCloner;

impl ContentCloner for PluginContentCloner {
    fn clone_item(
        &self,
        item: &ContentItem,
        new_parent: EntityId,
        new_placeholder: Option<PlaceholderId>,
    ) -> Result<ContentItem> {
        Ok(ContentItem {
            id: 0,
            parent_id: new_parent,
            placeholder_id: new_placeholder,
            sort_order: item.sort_order,
            plugin: item.plugin.clone(),
            payload: item.payload.clone(),
        })
    }
}

/// Authorization predicate for `published_for`
pub trait VisibilityPolicy {
    /// Whether `user` may be shown drafts when in a draft context
    fn may_view_drafts(&self, user: Option<&User>) -> bool;
}

/// Active staff, superusers and reviewer-group members may view drafts
#[derive(Debug, Clone)]
pub struct StaffVisibilityPolicy {
    reviewer_group: String,
}

impl StaffVisibilityPolicy {
    pub fn new(reviewer_group: impl Into<String>) -> Self {
        Self {
            reviewer_group: reviewer_group.into(),
        }
    }

    pub fn from_config(config: &PublishingConfig) -> Self {
        Self::new(config.reviewer_group.clone())
    }
}

impl Default for StaffVisibilityPolicy {
    fn default() -> Self {
        Self::from_config(&PublishingConfig::default())
    }
}

impl VisibilityPolicy for StaffVisibilityPolicy {
    fn may_view_drafts(&self, user: Option<&User>) -> bool {
        match user {
            Some(user) if user.is_active => {
                user.is_staff || user.is_superuser || user.in_group(&self.reviewer_group)
            }
            _ => false,
        }
    }
}
