//! Quire Core - draft/publish content-versioning kernel
//!
//! This crate provides the in-memory semantic kernel of Quire:
//! - Versioned entities with draft/published pairing, placeholders and content items
//! - Publish/unpublish transitions with deep cloning of dependent records
//! - Request-scoped draft context and a context-aware query layer
//! - The draft-access guard for rows surfaced through generic iteration
//! - Draft preview URL signing and the per-request publishing gate
//!
//! Persistence lives in `quire-store`; orchestration in `quire-engine`.

pub mod apply;
pub mod commands;
pub mod config;
pub mod context;
pub mod errors;
pub mod gate;
pub mod guard;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod policy;
pub mod publishing;
pub mod query;
pub mod resolver;
pub mod signing;

// Used by the logging macros
pub use quire_core_types;
#[doc(hidden)]
pub use tracing as __tracing;

// Re-export commonly used types
pub use apply::{apply, CommandOutcome};
pub use commands::Command;
pub use config::PublishingConfig;
pub use context::DraftContext;
pub use errors::{ExError, ExErrorKind, QuireError, Result};
pub use gate::{GateOutcome, GateRequest, GateResponse, PublishingGate, RequestKind};
pub use guard::{DraftGuard, GuardMode, Row};
pub use model::{ContentItem, EntityContent, Placeholder, User, VersionedEntity};
pub use ops::Store;
pub use policy::{ContentCloner, PluginContentCloner, StaffVisibilityPolicy, VisibilityPolicy};
pub use publishing::{publish, unpublish, PublishOutcome};
pub use query::EntityQuery;
pub use resolver::{SlugResolver, UrlResolver};
pub use signing::{DraftUrlSigner, MemorySecretStore, SecretStore};
