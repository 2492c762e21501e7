use chrono::{DateTime, Utc};

use crate::context::DraftContext;
use crate::errors::{QuireError, Result};
use crate::model::VersionedEntity;
use crate::ops::Store;

impl VersionedEntity {
    /// True only for the published copy itself
    pub fn is_published(&self) -> bool {
        !self.is_draft
    }

    /// True for a published copy, or a draft that has one
    pub fn has_been_published(&self) -> bool {
        !self.is_draft || self.linked_id.is_some()
    }

    /// Whether the draft changed since its last publish
    ///
    /// A draft without a counterpart is always dirty; a published copy
    /// never is.
    pub fn is_dirty(&self, store: &Store) -> bool {
        if !self.is_draft {
            return false;
        }
        match self.get_published(store) {
            Some(published) => self.modified_at > published.modified_at,
            None => true,
        }
    }

    /// Resolve to the draft member of the pair
    ///
    /// # Errors
    ///
    /// * `BrokenLink` - a published copy without an originating draft
    /// * `EntityNotFound` - the linked draft is missing from the store
    pub fn get_draft<'s>(&'s self, store: &'s Store) -> Result<&'s VersionedEntity> {
        if self.is_draft {
            return Ok(self);
        }
        let draft_id = self.linked_id.ok_or_else(|| QuireError::BrokenLink {
            entity_id: self.id,
            reason: "published copy has no originating draft".to_string(),
        })?;
        store.get_entity(draft_id)
    }

    /// Resolve to the published member of the pair, if any
    pub fn get_published<'s>(&'s self, store: &'s Store) -> Option<&'s VersionedEntity> {
        if !self.is_draft {
            return Some(self);
        }
        self.linked_id.and_then(|id| store.get_entity(id).ok())
    }

    /// The member of the pair the current request should see
    pub fn get_visible<'s>(
        &'s self,
        store: &'s Store,
        ctx: &DraftContext,
    ) -> Option<&'s VersionedEntity> {
        if ctx.is_draft_request() {
            self.get_draft(store).ok()
        } else {
            self.get_published(store)
        }
    }

    /// Whether this very copy is the one `get_visible` would return
    pub fn is_visible(&self, ctx: &DraftContext) -> bool {
        self.is_draft == ctx.is_draft_request()
    }

    /// Whether `at` falls in `[publication_date, publication_end_date)`
    pub fn is_within_publication_dates(&self, at: DateTime<Utc>) -> bool {
        let started = self.content.publication_date.map_or(true, |start| start <= at);
        let not_ended = self.content.publication_end_date.map_or(true, |end| at < end);
        started && not_ended
    }

    pub fn is_within_publication_dates_now(&self) -> bool {
        self.is_within_publication_dates(Utc::now())
    }
}
