//! Command orchestration layer.
//!
//! `engine_command` mutates the database, `engine_query` only reads it.

pub mod engine_command;
pub mod engine_query;
