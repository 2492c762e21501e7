//! Context-aware query layer
//!
//! `EntityQuery` is a materialized, ordered result set over a `Store`,
//! created under a request's `DraftContext`. Filters narrow it,
//! `exchange_for_published` swaps drafts for their published copies, and
//! terminal methods hand out rows, ids or projections.
//!
//! Every terminal that yields rows goes through the draft guard: inside a
//! public request a draft comes back as `Row::Guarded`. Raw entities are
//! only reachable through `fetch_unguarded`.
//!
//! ```
//! use quire_core::{DraftContext, EntityContent, Store};
//! use quire_core::ops::entity_ops::create_entity;
//!
//! let mut store = Store::new();
//! create_entity(&mut store, EntityContent::new("Hello", "hello")).unwrap();
//!
//! let mut ctx = DraftContext::new();
//! ctx.begin_request(None);
//! assert_eq!(store.query(&ctx).draft().count(), 1);
//! assert_eq!(store.query(&ctx).visible().count(), 0);
//! assert!(store.query(&ctx).into_iter().all(|row| row.is_guarded()));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::context::DraftContext;
use crate::errors::Result;
use crate::guard::{GuardMode, Row};
use crate::model::{EntityId, User, VersionedEntity};
use crate::ops::Store;
use crate::policy::VisibilityPolicy;

/// Ordered result set of versioned entities
#[derive(Debug, Clone)]
pub struct EntityQuery<'s> {
    store: &'s Store,
    mode: GuardMode,
    rows: Vec<&'s VersionedEntity>,
}

impl Store {
    /// All entities in id order, as seen from `ctx`
    pub fn query(&self, ctx: &DraftContext) -> EntityQuery<'_> {
        EntityQuery::new(self, ctx)
    }
}

impl<'s> EntityQuery<'s> {
    pub fn new(store: &'s Store, ctx: &DraftContext) -> Self {
        Self::from_entities(store, ctx, store.list_entities())
    }

    /// Query over an arbitrary ordered collection from the same store
    pub fn from_entities(
        store: &'s Store,
        ctx: &DraftContext,
        rows: Vec<&'s VersionedEntity>,
    ) -> Self {
        Self {
            store,
            mode: GuardMode::from_context(ctx),
            rows,
        }
    }

    // ===== Filters =====

    /// Drafts only, regardless of request context
    pub fn draft(self) -> Self {
        self.filter(|e| e.is_draft())
    }

    /// Published copies only
    pub fn published(self) -> Self {
        self.filter(|e| !e.is_draft())
    }

    /// Published copies, reached by exchanging linked drafts
    ///
    /// Drafts that were never published are dropped first, then every
    /// remaining draft is replaced by its published copy.
    pub fn published_exchanging(self) -> Self {
        self.filter(|e| !e.is_draft() || e.linked_id().is_some())
            .exchange_for_published()
    }

    /// Published copies, or whatever is visible if `user` may see drafts
    pub fn published_for(self, user: Option<&User>, policy: &dyn VisibilityPolicy) -> Self {
        if policy.may_view_drafts(user) {
            self.visible()
        } else {
            self.published()
        }
    }

    /// Drafts in a draft request, published copies otherwise
    pub fn visible(self) -> Self {
        if self.mode.is_draft_request() {
            self.draft()
        } else {
            self.published()
        }
    }

    /// Rows whose publication window contains `at`
    pub fn within_publication_dates(self, at: DateTime<Utc>) -> Self {
        self.filter(|e| e.is_within_publication_dates(at))
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&VersionedEntity) -> bool,
    {
        self.rows.retain(|e| predicate(e));
        self
    }

    // ===== Ordering and exchange =====

    pub fn order_by_id_desc(mut self) -> Self {
        self.rows.sort_by(|a, b| b.id.cmp(&a.id));
        self
    }

    pub fn order_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&VersionedEntity) -> K,
    {
        self.rows.sort_by_key(|e| key(e));
        self
    }

    /// Replace each draft with its published copy, keeping relative order
    ///
    /// Drafts with no published copy are dropped; published rows pass
    /// through. A copy reached twice appears once, at its first position.
    pub fn exchange_for_published(self) -> Self {
        let Self { store, mode, rows } = self;
        let mut seen: BTreeSet<EntityId> = BTreeSet::new();
        let rows = rows
            .into_iter()
            .filter_map(|e| e.get_published(store))
            .filter(|e| seen.insert(e.id))
            .collect();
        Self { store, mode, rows }
    }

    // ===== Terminals =====

    /// Rows with drafts guarded as the context requires
    pub fn fetch(self) -> Vec<Row<'s>> {
        self.into_iter().collect()
    }

    /// Raw entities, drafts included, with no guard applied
    ///
    /// For operator tooling that addresses both copies on purpose.
    pub fn fetch_unguarded(self) -> Vec<&'s VersionedEntity> {
        self.rows
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.rows.iter().map(|e| e.id).collect()
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<Row<'s>> {
        self.rows.first().copied().map(|e| self.mode.row(e, self.store))
    }

    /// Load only the named fields
    ///
    /// `id` and `is_draft` are always loaded so that guard decisions never
    /// need another lookup. `pk` is read as `id`.
    ///
    /// # Errors
    ///
    /// Returns `PublishingAccess` if a guarded draft row is asked for a
    /// field outside the guard's allow-list.
    pub fn only(&self, fields: &[&str]) -> Result<Projection> {
        let mut loaded: Vec<String> = vec!["id".to_string(), "is_draft".to_string()];
        for field in fields {
            let name = if *field == "pk" { "id" } else { *field };
            if !loaded.iter().any(|f| f == name) {
                loaded.push(name.to_string());
            }
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        for entity in &self.rows {
            let row = self.mode.row(entity, self.store);
            let mut values = BTreeMap::new();
            for name in &loaded {
                let value = row.field(name)?.unwrap_or(Value::Null);
                values.insert(name.clone(), value);
            }
            rows.push(values);
        }

        Ok(Projection {
            fields: loaded,
            rows,
        })
    }
}

impl<'s> IntoIterator for EntityQuery<'s> {
    type Item = Row<'s>;
    type IntoIter = std::vec::IntoIter<Row<'s>>;

    fn into_iter(self) -> Self::IntoIter {
        let Self { store, mode, rows } = self;
        rows.into_iter()
            .map(|entity| mode.row(entity, store))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

/// Result of `EntityQuery::only`
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    fields: Vec<String>,
    rows: Vec<BTreeMap<String, Value>>,
}

impl Projection {
    /// Names of the loaded fields, in load order
    pub fn loaded_fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[BTreeMap<String, Value>] {
        &self.rows
    }

    pub fn is_loaded(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}
