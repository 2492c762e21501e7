//! Quire Engine - Orchestration layer
//!
//! Coordinates the in-memory kernel with SQLite persistence: every command
//! runs load, apply and persist inside one database transaction, and page
//! requests are served through the publishing gate.

pub mod commands;
pub mod serve;

pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::engine_query::{
    apply_engine_query, EngineQuery, EngineQueryResult, EntityView, ListScope,
};
pub use serve::PageServer;
