use quire_core_types::RequestId;
use thiserror::Error;

use crate::model::{ContentItemId, EntityId, PlaceholderId};

/// Result type alias using QuireError
pub type Result<T> = std::result::Result<T, QuireError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers (CLI, HTTP adapters,
/// tests) can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidInput,
    InvalidTitle,
    InvalidPublicationWindow,
    NotFound,
    BrokenLink,

    // Publishing discipline
    NotDraft,
    InvalidWrapTarget,
    PublishingAccess,

    // Mutation
    CloneFailed,
    TransactionFailed,

    // Signing / gate
    InvalidUrl,
    SecretStore,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Configuration,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidTitle => "ERR_INVALID_TITLE",
            ExErrorKind::InvalidPublicationWindow => "ERR_INVALID_PUBLICATION_WINDOW",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::BrokenLink => "ERR_BROKEN_LINK",
            ExErrorKind::NotDraft => "ERR_NOT_DRAFT",
            ExErrorKind::InvalidWrapTarget => "ERR_INVALID_WRAP_TARGET",
            ExErrorKind::PublishingAccess => "ERR_PUBLISHING_ACCESS",
            ExErrorKind::CloneFailed => "ERR_CLONE_FAILED",
            ExErrorKind::TransactionFailed => "ERR_TRANSACTION_FAILED",
            ExErrorKind::InvalidUrl => "ERR_INVALID_URL",
            ExErrorKind::SecretStore => "ERR_SECRET_STORE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification plus optional context. Persistence and engine
/// layers use this directly as their error type.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    field: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            field: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Add field name context (guarded draft access)
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for publishing operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuireError {
    // ===== Publishing discipline =====
    /// A draft-only operation was invoked on a published copy
    #[error("Entity {entity_id} is not a draft: operation requires the draft copy")]
    NotDraft { entity_id: EntityId },

    /// Attempted to guard a non-draft entity
    #[error("Cannot guard entity {entity_id}: it is not a DRAFT")]
    InvalidWrapTarget { entity_id: EntityId },

    /// A guarded draft's content field was touched
    #[error("Illegal attempt to access '{field}' on the DRAFT entity {entity_id}")]
    PublishingAccess { field: String, entity_id: EntityId },

    // ===== Structural Errors =====
    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: EntityId },

    #[error("Placeholder not found: {placeholder_id}")]
    PlaceholderNotFound { placeholder_id: PlaceholderId },

    #[error("Content item not found: {item_id}")]
    ContentItemNotFound { item_id: ContentItemId },

    /// Draft/published pairing is inconsistent (integrity violation)
    #[error("Broken publishing link on entity {entity_id}: {reason}")]
    BrokenLink { entity_id: EntityId, reason: String },

    // ===== Validation Errors =====
    /// Invalid title (empty or whitespace-only)
    #[error("Invalid title: {reason}")]
    InvalidTitle { reason: String },

    /// Invalid slug (empty or containing '/')
    #[error("Invalid slug: {reason}")]
    InvalidSlug { reason: String },

    /// Publication end date does not come after the start date
    #[error("Invalid publication window: {reason}")]
    InvalidPublicationWindow { reason: String },

    // ===== Mutation Errors =====
    /// The content-block collaborator could not clone an item
    #[error("Failed to clone content item {item_id}: {reason}")]
    CloneFailed { item_id: ContentItemId, reason: String },

    /// A multi-row transition was rolled back
    #[error("Transaction '{op}' rolled back: {reason}")]
    TransactionFailed { op: String, reason: String },

    // ===== Signing / configuration =====
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Secret store failure: {reason}")]
    SecretStore { reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ===== Generic Errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<QuireError> for ExError {
    fn from(err: QuireError) -> Self {
        let message = err.to_string();
        match err {
            QuireError::NotDraft { entity_id } => ExError::new(ExErrorKind::NotDraft)
                .with_entity_id(entity_id)
                .with_message(message),

            QuireError::InvalidWrapTarget { entity_id } => {
                ExError::new(ExErrorKind::InvalidWrapTarget)
                    .with_entity_id(entity_id)
                    .with_op("guard_draft")
                    .with_message(message)
            }

            QuireError::PublishingAccess { field, entity_id } => {
                ExError::new(ExErrorKind::PublishingAccess)
                    .with_entity_id(entity_id)
                    .with_field(field)
                    .with_message(message)
            }

            QuireError::EntityNotFound { entity_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(entity_id)
                .with_message(message),

            QuireError::PlaceholderNotFound { placeholder_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(placeholder_id)
                    .with_message(message)
            }

            QuireError::ContentItemNotFound { item_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(item_id)
                .with_message(message),

            QuireError::BrokenLink { entity_id, .. } => ExError::new(ExErrorKind::BrokenLink)
                .with_entity_id(entity_id)
                .with_message(message),

            QuireError::InvalidTitle { .. } => {
                ExError::new(ExErrorKind::InvalidTitle).with_message(message)
            }

            QuireError::InvalidSlug { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }

            QuireError::InvalidPublicationWindow { .. } => {
                ExError::new(ExErrorKind::InvalidPublicationWindow).with_message(message)
            }

            QuireError::CloneFailed { item_id, .. } => ExError::new(ExErrorKind::CloneFailed)
                .with_entity_id(item_id)
                .with_message(message),

            QuireError::TransactionFailed { op, .. } => {
                ExError::new(ExErrorKind::TransactionFailed)
                    .with_op(op)
                    .with_message(message)
            }

            QuireError::InvalidUrl { .. } => {
                ExError::new(ExErrorKind::InvalidUrl).with_message(message)
            }

            QuireError::SecretStore { .. } => {
                ExError::new(ExErrorKind::SecretStore).with_message(message)
            }

            QuireError::InvalidConfig { .. } => {
                ExError::new(ExErrorKind::Configuration).with_message(message)
            }

            QuireError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }

            QuireError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for QuireError {
    fn from(err: serde_json::Error) -> Self {
        QuireError::Serialization {
            message: err.to_string(),
        }
    }
}
