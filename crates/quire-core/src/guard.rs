//! Draft-access guard
//!
//! `DraftGuard` is a read-only facade over a draft that only exposes
//! identity and publishing-state accessors. It is what generic iteration
//! hands out for draft rows outside a verified draft context, so code that
//! is unaware of drafts cannot render draft content by accident.
//!
//! Named accessors cover the typed path. `field()` is the dynamic path: a
//! fixed allow-list, everything else fails with `PublishingAccess`.

use serde_json::Value;

use crate::context::DraftContext;
use crate::errors::{QuireError, Result};
use crate::model::{EntityId, VersionedEntity};
use crate::ops::Store;

/// Fields readable through `DraftGuard::field`
pub const ALLOWED_FIELDS: &[&str] = &[
    "pk",
    "id",
    "is_draft",
    "is_published",
    "has_been_published",
    "is_visible",
    "linked",
    "linked_id",
];

/// Read-only facade over a draft entity
#[derive(Debug, Clone, Copy)]
pub struct DraftGuard<'a> {
    entity: &'a VersionedEntity,
    store: &'a Store,
    draft_request: bool,
}

impl<'a> DraftGuard<'a> {
    /// Guard a draft
    ///
    /// # Errors
    ///
    /// Returns `InvalidWrapTarget` if `entity` is a published copy.
    pub fn new(entity: &'a VersionedEntity, store: &'a Store, ctx: &DraftContext) -> Result<Self> {
        if !entity.is_draft() {
            return Err(QuireError::InvalidWrapTarget {
                entity_id: entity.id,
            });
        }
        Ok(Self::wrap(entity, store, ctx.is_draft_request()))
    }

    fn wrap(entity: &'a VersionedEntity, store: &'a Store, draft_request: bool) -> Self {
        Self {
            entity,
            store,
            draft_request,
        }
    }

    pub fn pk(&self) -> EntityId {
        self.entity.id
    }

    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    pub fn is_draft(&self) -> bool {
        true
    }

    pub fn is_published(&self) -> bool {
        self.entity.is_published()
    }

    pub fn has_been_published(&self) -> bool {
        self.entity.has_been_published()
    }

    /// Visibility as of the context the guard was created in
    pub fn is_visible(&self) -> bool {
        self.draft_request
    }

    pub fn linked_id(&self) -> Option<EntityId> {
        self.entity.linked_id()
    }

    /// The published counterpart, unguarded
    pub fn linked(&self) -> Option<&'a VersionedEntity> {
        self.entity.get_published(self.store)
    }

    /// Explicitly take the draft itself
    ///
    /// Callers that ask for the draft by name have opted in to draft
    /// content; this is the one way through the guard.
    pub fn get_draft(&self) -> &'a VersionedEntity {
        self.entity
    }

    pub fn get_published(&self) -> Option<&'a VersionedEntity> {
        self.entity.get_published(self.store)
    }

    pub fn get_visible(&self) -> Option<&'a VersionedEntity> {
        if self.draft_request {
            Some(self.entity)
        } else {
            self.get_published()
        }
    }

    /// Dynamic field access against the allow-list
    ///
    /// # Errors
    ///
    /// Returns `PublishingAccess` naming the field for anything not in
    /// `ALLOWED_FIELDS`.
    pub fn field(&self, name: &str) -> Result<Value> {
        match name {
            "pk" | "id" => Ok(Value::from(self.pk())),
            "is_draft" => Ok(Value::Bool(self.is_draft())),
            "is_published" => Ok(Value::Bool(self.is_published())),
            "has_been_published" => Ok(Value::Bool(self.has_been_published())),
            "is_visible" => Ok(Value::Bool(self.is_visible())),
            "linked" | "linked_id" => Ok(self.linked_id().map(Value::from).unwrap_or(Value::Null)),
            other => {
                tracing::warn!(
                    entity_id = self.entity.id,
                    field = other,
                    "blocked draft field access"
                );
                Err(QuireError::PublishingAccess {
                    field: other.to_string(),
                    entity_id: self.entity.id,
                })
            }
        }
    }
}

/// A row handed out by generic iteration
#[derive(Debug, Clone, Copy)]
pub enum Row<'a> {
    Entity(&'a VersionedEntity),
    Guarded(DraftGuard<'a>),
}

impl<'a> Row<'a> {
    pub fn id(&self) -> EntityId {
        match self {
            Row::Entity(entity) => entity.id,
            Row::Guarded(guard) => guard.id(),
        }
    }

    pub fn is_draft(&self) -> bool {
        match self {
            Row::Entity(entity) => entity.is_draft(),
            Row::Guarded(guard) => guard.is_draft(),
        }
    }

    pub fn is_guarded(&self) -> bool {
        matches!(self, Row::Guarded(_))
    }

    /// Field by name; unknown fields on a plain entity read as None
    ///
    /// # Errors
    ///
    /// Returns `PublishingAccess` for a non-allow-listed field of a guarded row.
    pub fn field(&self, name: &str) -> Result<Option<Value>> {
        match self {
            Row::Entity(entity) => Ok(entity.field_value(name)),
            Row::Guarded(guard) => guard.field(name).map(Some),
        }
    }

    /// The entity, if the row is not guarded
    pub fn entity(&self) -> Option<&'a VersionedEntity> {
        match *self {
            Row::Entity(entity) => Some(entity),
            Row::Guarded(_) => None,
        }
    }
}

/// Context flags that decide whether a draft row is guarded
///
/// Captured when a query is created, so the result set does not borrow the
/// context it was built under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardMode {
    guard_drafts: bool,
    draft_request: bool,
}

impl GuardMode {
    /// A draft is guarded when the publishing layer is active and the
    /// request is not a draft request.
    pub fn from_context(ctx: &DraftContext) -> Self {
        Self {
            guard_drafts: ctx.is_publishing_active() && !ctx.is_draft_request(),
            draft_request: ctx.is_draft_request(),
        }
    }

    pub fn is_draft_request(&self) -> bool {
        self.draft_request
    }

    pub fn row<'a>(&self, entity: &'a VersionedEntity, store: &'a Store) -> Row<'a> {
        if self.guard_drafts && entity.is_draft() {
            Row::Guarded(DraftGuard::wrap(entity, store, self.draft_request))
        } else {
            Row::Entity(entity)
        }
    }
}

/// Wrap draft rows for generic iteration
///
/// Published rows, and every row when the layer is inactive, come back as
/// plain entities.
pub fn guarded_rows<'a, I>(rows: I, store: &'a Store, ctx: &DraftContext) -> Vec<Row<'a>>
where
    I: IntoIterator<Item = &'a VersionedEntity>,
{
    let mode = GuardMode::from_context(ctx);
    rows.into_iter().map(|entity| mode.row(entity, store)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityContent;
    use crate::ops::entity_ops;

    fn setup() -> (Store, EntityId) {
        let mut store = Store::new();
        let id = entity_ops::create_entity(&mut store, EntityContent::new("Secret", "secret"))
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_title_access_is_blocked() {
        let (store, id) = setup();
        let ctx = DraftContext::new();
        let guard = DraftGuard::new(store.get_entity(id).unwrap(), &store, &ctx).unwrap();

        let err = guard.field("title").unwrap_err();
        assert!(err
            .to_string()
            .contains("Illegal attempt to access 'title' on the DRAFT"));
        assert_eq!(guard.field("is_published").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_every_allowed_field_is_readable() {
        let (store, id) = setup();
        let ctx = DraftContext::new();
        let guard = DraftGuard::new(store.get_entity(id).unwrap(), &store, &ctx).unwrap();
        for name in ALLOWED_FIELDS {
            assert!(guard.field(name).is_ok(), "{} should be readable", name);
        }
    }

    #[test]
    fn test_inactive_layer_returns_plain_rows() {
        let (store, _) = setup();
        let ctx = DraftContext::new();
        let rows = guarded_rows(store.list_entities(), &store, &ctx);
        assert!(rows.iter().all(|r| !r.is_guarded()));
    }

    #[test]
    fn test_linked_reads_counterpart_id() {
        let mut store = Store::new();
        let id = entity_ops::create_entity(&mut store, EntityContent::new("Linked", "linked"))
            .unwrap();
        let ctx = DraftContext::new();
        {
            let guard = DraftGuard::new(store.get_entity(id).unwrap(), &store, &ctx).unwrap();
            assert_eq!(guard.field("linked").unwrap(), Value::Null);
        }

        let outcome =
            crate::publishing::publish(&mut store, id, &crate::policy::PluginContentCloner)
                .unwrap();

        let guard = DraftGuard::new(store.get_entity(id).unwrap(), &store, &ctx).unwrap();
        assert_eq!(guard.field("linked").unwrap(), Value::from(outcome.published_id));
        assert_eq!(guard.linked().map(|e| e.id), Some(outcome.published_id));
    }

    #[test]
    fn test_active_layer_guards_drafts() {
        let (store, _) = setup();
        let mut ctx = DraftContext::new();
        ctx.begin_request(None);
        let rows = guarded_rows(store.list_entities(), &store, &ctx);
        assert!(rows.iter().all(|r| r.is_guarded()));
        assert!(rows[0].field("slug").is_err());
    }
}
