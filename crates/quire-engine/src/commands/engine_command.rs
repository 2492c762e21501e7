//! Engine-level commands: kernel commands made durable.

#![allow(clippy::result_large_err)]

use std::time::Instant;

use quire_core::signing::DraftUrlSigner;
use quire_core::{apply, Command, CommandOutcome, ContentCloner, PublishingConfig};
use quire_core::{log_op_end, log_op_error, log_op_start};
use quire_store::errors::{from_rusqlite, Result};
use quire_store::{load_store, SqliteRepo, SqliteSecretStore};
use rusqlite::Connection;

/// Commands that require the database.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Run a kernel command against the persisted state.
    Kernel(Command),
    /// Replace the draft preview secret; every outstanding link stops verifying.
    RotateSecret,
}

/// Result of applying an engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommandResult {
    Kernel(CommandOutcome),
    SecretRotated,
}

/// Apply an engine command in one SQLite transaction.
///
/// The store is hydrated, the kernel command applied and its change journal
/// written back before commit. Any failure rolls the transaction back, so
/// concurrent readers see either the old or the new state.
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    cloner: &dyn ContentCloner,
    config: &PublishingConfig,
) -> Result<EngineCommandResult> {
    match cmd {
        EngineCommand::Kernel(cmd) => {
            apply_kernel_command(cmd, conn, cloner).map(EngineCommandResult::Kernel)
        }
        EngineCommand::RotateSecret => {
            let tx = conn.transaction().map_err(from_rusqlite)?;
            DraftUrlSigner::new(&SqliteSecretStore::new(&tx), config.clone()).rotate_secret()?;
            tx.commit().map_err(from_rusqlite)?;
            Ok(EngineCommandResult::SecretRotated)
        }
    }
}

fn apply_kernel_command(
    cmd: Command,
    conn: &mut Connection,
    cloner: &dyn ContentCloner,
) -> Result<CommandOutcome> {
    let op = command_name(&cmd);
    log_op_start!("engine_command", command = op);
    let start = Instant::now();

    let result = apply_kernel_command_impl(cmd, conn, cloner);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => log_op_end!("engine_command", duration_ms = duration_ms, command = op),
        Err(err) => log_op_error!(
            "engine_command",
            err.clone(),
            duration_ms = duration_ms,
            command = op
        ),
    }
    result
}

fn apply_kernel_command_impl(
    cmd: Command,
    conn: &mut Connection,
    cloner: &dyn ContentCloner,
) -> Result<CommandOutcome> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    let state = load_store(&tx)?;
    let (mut state, outcome) = apply(state, cmd, cloner)?;
    let changes = state.take_changes();
    SqliteRepo::persist_changes(&tx, &state, &changes)?;
    tx.commit().map_err(from_rusqlite)?;
    Ok(outcome)
}

fn command_name(cmd: &Command) -> &'static str {
    match cmd {
        Command::EntityCreate { .. } => "entity_create",
        Command::EntityUpdate { .. } => "entity_update",
        Command::EntityDelete { .. } => "entity_delete",
        Command::PlaceholderCreate { .. } => "placeholder_create",
        Command::PlaceholderUpdate { .. } => "placeholder_update",
        Command::ContentItemCreate { .. } => "content_item_create",
        Command::ContentItemUpdate { .. } => "content_item_update",
        Command::ContentItemDelete { .. } => "content_item_delete",
        Command::Publish { .. } => "publish",
        Command::Unpublish { .. } => "unpublish",
    }
}
