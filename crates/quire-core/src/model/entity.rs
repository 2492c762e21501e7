use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{QuireError, Result};

/// Store-assigned entity identifier (monotonic, like an autoincrement key)
pub type EntityId = u64;

/// The scalar content of an entity
///
/// Everything in here is copied verbatim onto the published counterpart on
/// publish. Identity and versioning state live on `VersionedEntity` and are
/// never copied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityContent {
    pub title: String,

    /// Path segment used by the URL resolver
    pub slug: String,

    /// Free-form content fields
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,

    /// Start of the publication window (inclusive), unbounded if None
    pub publication_date: Option<DateTime<Utc>>,

    /// End of the publication window (exclusive), unbounded if None
    pub publication_end_date: Option<DateTime<Utc>>,
}

impl EntityContent {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_publication_window(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.publication_date = start;
        self.publication_end_date = end;
        self
    }

    /// Validate the content before it is stored
    ///
    /// # Errors
    /// * `InvalidTitle` - title empty or whitespace-only
    /// * `InvalidSlug` - slug empty or containing '/'
    /// * `InvalidPublicationWindow` - end date not after start date
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(QuireError::InvalidTitle {
                reason: "Title cannot be empty or whitespace-only".to_string(),
            });
        }

        if self.slug.trim().is_empty() || self.slug.contains('/') {
            return Err(QuireError::InvalidSlug {
                reason: format!("'{}' is not a single path segment", self.slug),
            });
        }

        if let (Some(start), Some(end)) = (self.publication_date, self.publication_end_date) {
            if end <= start {
                return Err(QuireError::InvalidPublicationWindow {
                    reason: format!("end {} is not after start {}", end, start),
                });
            }
        }

        Ok(())
    }
}

/// Versioning state restored from persistence
#[derive(Debug, Clone, PartialEq)]
pub struct VersioningState {
    pub is_draft: bool,
    pub linked_id: Option<EntityId>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A record participating in the draft/publish scheme
///
/// Versioning fields are only writable from inside this crate: the publish
/// and unpublish transitions own them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedEntity {
    pub id: EntityId,

    #[serde(flatten)]
    pub content: EntityContent,

    pub(crate) is_draft: bool,

    /// Draft -> published counterpart, published -> originating draft
    pub(crate) linked_id: Option<EntityId>,

    pub(crate) published_at: Option<DateTime<Utc>>,

    pub(crate) created_at: DateTime<Utc>,

    /// Bumped on every mutation of the entity or one of its children
    pub(crate) modified_at: DateTime<Utc>,
}

impl VersionedEntity {
    /// A fresh, unlinked draft; the store assigns the id on insert
    pub(crate) fn new_draft(content: EntityContent, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            content,
            is_draft: true,
            linked_id: None,
            published_at: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Rebuild an entity from persisted columns (hydration only)
    pub fn from_parts(id: EntityId, content: EntityContent, state: VersioningState) -> Self {
        Self {
            id,
            content,
            is_draft: state.is_draft,
            linked_id: state.linked_id,
            published_at: state.published_at,
            created_at: state.created_at,
            modified_at: state.modified_at,
        }
    }

    pub fn versioning_state(&self) -> VersioningState {
        VersioningState {
            is_draft: self.is_draft,
            linked_id: self.linked_id,
            published_at: self.published_at,
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }

    pub fn title(&self) -> &str {
        &self.content.title
    }

    pub fn slug(&self) -> &str {
        &self.content.slug
    }

    pub fn is_draft(&self) -> bool {
        self.is_draft
    }

    pub fn linked_id(&self) -> Option<EntityId> {
        self.linked_id
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Look up a field by name, covering both columns and content fields
    ///
    /// `pk` is an alias for `id`. Returns None for unknown names.
    pub fn field_value(&self, name: &str) -> Option<Value> {
        match name {
            "id" | "pk" => Some(Value::from(self.id)),
            "title" => Some(Value::String(self.content.title.clone())),
            "slug" => Some(Value::String(self.content.slug.clone())),
            "is_draft" => Some(Value::Bool(self.is_draft)),
            "linked_id" => Some(self.linked_id.map(Value::from).unwrap_or(Value::Null)),
            "published_at" => Some(ts(self.published_at)),
            "created_at" => Some(ts(Some(self.created_at))),
            "modified_at" => Some(ts(Some(self.modified_at))),
            "publication_date" => Some(ts(self.content.publication_date)),
            "publication_end_date" => Some(ts(self.content.publication_end_date)),
            other => self.content.fields.get(other).cloned(),
        }
    }
}

fn ts(value: Option<DateTime<Utc>>) -> Value {
    value
        .map(|t| Value::String(t.to_rfc3339()))
        .unwrap_or(Value::Null)
}
