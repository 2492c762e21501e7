use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeZone, Utc};

use crate::errors::{QuireError, Result};
use crate::model::{
    ContentItem, ContentItemId, EntityId, Placeholder, PlaceholderId, VersionedEntity,
};

/// Rows touched since the journal was last drained
///
/// The persistence layer uses this to write back only what a command
/// changed. An id is never in both the upserted and the removed set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub upserted_entities: BTreeSet<EntityId>,
    pub removed_entities: BTreeSet<EntityId>,
    pub upserted_placeholders: BTreeSet<PlaceholderId>,
    pub removed_placeholders: BTreeSet<PlaceholderId>,
    pub upserted_items: BTreeSet<ContentItemId>,
    pub removed_items: BTreeSet<ContentItemId>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.upserted_entities.is_empty()
            && self.removed_entities.is_empty()
            && self.upserted_placeholders.is_empty()
            && self.removed_placeholders.is_empty()
            && self.upserted_items.is_empty()
            && self.removed_items.is_empty()
    }
}

/// Last identifier handed out per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequences {
    pub entities: u64,
    pub placeholders: u64,
    pub items: u64,
}

/// In-memory store for entities, placeholders and content items
///
/// Rows are kept in id order so that iteration matches primary-key order.
/// Not thread-safe: one store belongs to one command or one request.
#[derive(Debug, Clone, Default)]
pub struct Store {
    pub(crate) entities: BTreeMap<EntityId, VersionedEntity>,
    pub(crate) placeholders: BTreeMap<PlaceholderId, Placeholder>,
    pub(crate) items: BTreeMap<ContentItemId, ContentItem>,
    sequences: Sequences,
    /// Last timestamp handed out by `stamp()`
    clock: Option<DateTime<Utc>>,
    changes: ChangeSet,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Clock =====

    /// Current time, strictly later than any time handed out before
    ///
    /// Timestamps are truncated to microseconds so they survive a round trip
    /// through persistence unchanged.
    pub fn stamp(&mut self) -> DateTime<Utc> {
        let now = truncate_to_micros(Utc::now());
        let next = match self.clock {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn observe(&mut self, at: DateTime<Utc>) {
        if self.clock.map_or(true, |last| at > last) {
            self.clock = Some(at);
        }
    }

    // ===== Entities =====

    /// Get an entity by ID
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if no entity has this id.
    pub fn get_entity(&self, id: EntityId) -> Result<&VersionedEntity> {
        self.entities
            .get(&id)
            .ok_or(QuireError::EntityNotFound { entity_id: id })
    }

    /// Get a mutable entity and journal it as upserted
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if no entity has this id.
    pub fn get_entity_mut(&mut self, id: EntityId) -> Result<&mut VersionedEntity> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(QuireError::EntityNotFound { entity_id: id })?;
        self.changes.upserted_entities.insert(id);
        Ok(entity)
    }

    /// All entities in id order
    ///
    /// Crate-internal: outside callers iterate through `query`, which
    /// applies the draft guard.
    pub(crate) fn list_entities(&self) -> Vec<&VersionedEntity> {
        self.entities.values().collect()
    }

    /// Ids of every entity, in id order
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Insert a new entity, assigning it the next id
    pub fn insert_entity(&mut self, mut entity: VersionedEntity) -> EntityId {
        self.sequences.entities += 1;
        entity.id = self.sequences.entities;
        let id = entity.id;
        self.entities.insert(id, entity);
        self.changes.upserted_entities.insert(id);
        id
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<VersionedEntity> {
        let removed = self.entities.remove(&id)?;
        self.changes.upserted_entities.remove(&id);
        self.changes.removed_entities.insert(id);
        Some(removed)
    }

    /// Bump an entity's `modified_at`
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if no entity has this id.
    pub fn touch_entity(&mut self, id: EntityId) -> Result<()> {
        let now = self.stamp();
        self.get_entity_mut(id)?.modified_at = now;
        Ok(())
    }

    // ===== Placeholders =====

    /// Get a placeholder by ID
    ///
    /// # Errors
    ///
    /// Returns `PlaceholderNotFound` if no placeholder has this id.
    pub fn get_placeholder(&self, id: PlaceholderId) -> Result<&Placeholder> {
        self.placeholders
            .get(&id)
            .ok_or(QuireError::PlaceholderNotFound { placeholder_id: id })
    }

    /// # Errors
    ///
    /// Returns `PlaceholderNotFound` if no placeholder has this id.
    pub fn get_placeholder_mut(&mut self, id: PlaceholderId) -> Result<&mut Placeholder> {
        let placeholder = self
            .placeholders
            .get_mut(&id)
            .ok_or(QuireError::PlaceholderNotFound { placeholder_id: id })?;
        self.changes.upserted_placeholders.insert(id);
        Ok(placeholder)
    }

    /// Placeholders owned by an entity, in id order
    pub fn placeholders_for(&self, parent_id: EntityId) -> Vec<&Placeholder> {
        self.placeholders
            .values()
            .filter(|p| p.parent_id == parent_id)
            .collect()
    }

    pub fn insert_placeholder(&mut self, mut placeholder: Placeholder) -> PlaceholderId {
        self.sequences.placeholders += 1;
        placeholder.id = self.sequences.placeholders;
        let id = placeholder.id;
        self.placeholders.insert(id, placeholder);
        self.changes.upserted_placeholders.insert(id);
        id
    }

    pub fn remove_placeholder(&mut self, id: PlaceholderId) -> Option<Placeholder> {
        let removed = self.placeholders.remove(&id)?;
        self.changes.upserted_placeholders.remove(&id);
        self.changes.removed_placeholders.insert(id);
        Some(removed)
    }

    // ===== Content items =====

    /// Get a content item by ID
    ///
    /// # Errors
    ///
    /// Returns `ContentItemNotFound` if no item has this id.
    pub fn get_item(&self, id: ContentItemId) -> Result<&ContentItem> {
        self.items
            .get(&id)
            .ok_or(QuireError::ContentItemNotFound { item_id: id })
    }

    /// # Errors
    ///
    /// Returns `ContentItemNotFound` if no item has this id.
    pub fn get_item_mut(&mut self, id: ContentItemId) -> Result<&mut ContentItem> {
        let item = self
            .items
            .get_mut(&id)
            .ok_or(QuireError::ContentItemNotFound { item_id: id })?;
        self.changes.upserted_items.insert(id);
        Ok(item)
    }

    /// Content items owned by an entity, ordered by placeholder then sort order
    pub fn items_for(&self, parent_id: EntityId) -> Vec<&ContentItem> {
        let mut items: Vec<&ContentItem> = self
            .items
            .values()
            .filter(|i| i.parent_id == parent_id)
            .collect();
        items.sort_by_key(|i| (i.placeholder_id, i.sort_order, i.id));
        items
    }

    /// Content items assigned to one placeholder, in sort order
    pub fn items_in_placeholder(&self, placeholder_id: PlaceholderId) -> Vec<&ContentItem> {
        let mut items: Vec<&ContentItem> = self
            .items
            .values()
            .filter(|i| i.placeholder_id == Some(placeholder_id))
            .collect();
        items.sort_by_key(|i| (i.sort_order, i.id));
        items
    }

    pub fn insert_item(&mut self, mut item: ContentItem) -> ContentItemId {
        self.sequences.items += 1;
        item.id = self.sequences.items;
        let id = item.id;
        self.items.insert(id, item);
        self.changes.upserted_items.insert(id);
        id
    }

    pub fn remove_item(&mut self, id: ContentItemId) -> Option<ContentItem> {
        let removed = self.items.remove(&id)?;
        self.changes.upserted_items.remove(&id);
        self.changes.removed_items.insert(id);
        Some(removed)
    }

    /// Remove every placeholder and content item owned by an entity
    ///
    /// Returns the number of (placeholders, items) removed.
    pub fn remove_children(&mut self, parent_id: EntityId) -> (usize, usize) {
        let item_ids: Vec<ContentItemId> = self.items_for(parent_id).iter().map(|i| i.id).collect();
        let placeholder_ids: Vec<PlaceholderId> = self
            .placeholders_for(parent_id)
            .iter()
            .map(|p| p.id)
            .collect();
        for id in &item_ids {
            self.remove_item(*id);
        }
        for id in &placeholder_ids {
            self.remove_placeholder(*id);
        }
        (placeholder_ids.len(), item_ids.len())
    }

    // ===== Hydration =====

    /// Restore a persisted entity, keeping its id
    ///
    /// Not journaled. Advances the id sequence and the clock past the row.
    pub fn restore_entity(&mut self, entity: VersionedEntity) {
        self.sequences.entities = self.sequences.entities.max(entity.id);
        self.observe(entity.modified_at);
        if let Some(published_at) = entity.published_at {
            self.observe(published_at);
        }
        self.entities.insert(entity.id, entity);
    }

    pub fn restore_placeholder(&mut self, placeholder: Placeholder) {
        self.sequences.placeholders = self.sequences.placeholders.max(placeholder.id);
        self.placeholders.insert(placeholder.id, placeholder);
    }

    pub fn restore_item(&mut self, item: ContentItem) {
        self.sequences.items = self.sequences.items.max(item.id);
        self.items.insert(item.id, item);
    }

    /// Raise the id sequences to at least the persisted values
    ///
    /// Keeps ids of deleted rows from being reused after a reload.
    pub fn restore_sequences(&mut self, sequences: Sequences) {
        self.sequences.entities = self.sequences.entities.max(sequences.entities);
        self.sequences.placeholders = self.sequences.placeholders.max(sequences.placeholders);
        self.sequences.items = self.sequences.items.max(sequences.items);
    }

    pub fn sequences(&self) -> Sequences {
        self.sequences
    }

    // ===== Journal and transactions =====

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Drain the change journal
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }

    /// Run `f` against this store, all-or-nothing
    ///
    /// On error every row, sequence and journal entry is restored to its
    /// state before the call.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Store) -> Result<T>,
    {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }
}

fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_micros(at.timestamp_micros())
        .single()
        .unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityContent;

    fn draft(title: &str) -> VersionedEntity {
        VersionedEntity::new_draft(EntityContent::new(title, "slug"), Utc::now())
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut store = Store::new();
        let a = store.insert_entity(draft("a"));
        let b = store.insert_entity(draft("b"));
        store.remove_entity(b);
        let c = store.insert_entity(draft("c"));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_stamp_is_strictly_increasing() {
        let mut store = Store::new();
        let stamps: Vec<_> = (0..100).map(|_| store.stamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_removed_id_leaves_upserted_set() {
        let mut store = Store::new();
        let id = store.insert_entity(draft("a"));
        store.remove_entity(id);
        let changes = store.take_changes();
        assert!(!changes.upserted_entities.contains(&id));
        assert!(changes.removed_entities.contains(&id));
        assert!(store.changes().is_empty());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut store = Store::new();
        let kept = store.insert_entity(draft("kept"));
        store.take_changes();

        let result: Result<()> = store.transaction(|tx| {
            tx.insert_entity(draft("doomed"));
            tx.remove_entity(kept);
            Err(QuireError::Internal {
                message: "boom".to_string(),
            })
        });

        assert!(result.is_err());
        assert_eq!(store.list_entities().len(), 1);
        assert!(store.get_entity(kept).is_ok());
        assert!(store.changes().is_empty());
    }

    #[test]
    fn test_restore_keeps_ids_and_advances_sequence() {
        let mut store = Store::new();
        let mut entity = draft("restored");
        entity.id = 41;
        store.restore_entity(entity);
        assert!(store.changes().is_empty());
        assert_eq!(store.insert_entity(draft("next")), 42);
    }

    #[test]
    fn test_items_for_orders_by_placeholder_then_sort_order() {
        let mut store = Store::new();
        let parent = store.insert_entity(draft("p"));
        let mut second = ContentItem::new(parent, Some(1), "text", serde_json::json!({}));
        second.sort_order = 1;
        let first = ContentItem::new(parent, Some(1), "text", serde_json::json!({}));
        let b = store.insert_item(second);
        let a = store.insert_item(first);
        let ordered: Vec<_> = store.items_for(parent).iter().map(|i| i.id).collect();
        assert_eq!(ordered, vec![a, b]);
    }
}
