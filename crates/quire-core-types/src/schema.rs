//! Canonical schema constants for structured logging and events
//!
//! These constants keep log field names stable across the kernel, the
//! persistence layer and the engine.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Entity identifiers
pub const FIELD_ENTITY_ID: &str = "entity_id";
pub const FIELD_PUBLISHED_ID: &str = "published_id";
pub const FIELD_PATH: &str = "path";

// Gate decisions
pub const FIELD_REQUEST_KIND: &str = "request_kind";
pub const FIELD_IS_DRAFT: &str = "is_draft";

// Collection sizes
pub const FIELD_CLONED_ITEMS: &str = "cloned_items";
pub const FIELD_CLONED_PLACEHOLDERS: &str = "cloned_placeholders";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
