//! Functional-boundary apply function
//!
//! `apply()` is the canonical entry point for atomic state mutations.
//!
//! ## Atomicity Contract
//!
//! - **All-or-nothing**: the command runs inside a store transaction; on
//!   error no row, id sequence or journal entry of the state is changed
//! - **No panics**: invalid input returns typed errors
//! - **Journaled**: the returned state's change journal lists every row the
//!   command touched, for the persistence layer to write back
//!
//! ## Example
//!
//! ```
//! use quire_core::{apply, Command, CommandOutcome, EntityContent, Store};
//! use quire_core::policy::PluginContentCloner;
//!
//! let cmd = Command::EntityCreate {
//!     content: EntityContent::new("Hello, world!", "hello"),
//! };
//! let (state, outcome) = apply(Store::new(), cmd, &PluginContentCloner).unwrap();
//! assert!(matches!(outcome, CommandOutcome::EntityCreated(_)));
//! assert_eq!(state.entity_ids().len(), 1);
//! ```

use crate::commands::Command;
pub use crate::commands::CommandOutcome;
use crate::errors::Result;
use crate::ops::{content_ops, entity_ops, Store};
use crate::policy::ContentCloner;
use crate::publishing::{publish, unpublish};

/// Apply a command to a store, returning the new state and what happened
///
/// # Errors
///
/// Returns the typed error of the underlying operation (validation,
/// not-found, `NotDraft`, `TransactionFailed`). See `QuireError` for the
/// full taxonomy.
pub fn apply(
    mut state: Store,
    cmd: Command,
    cloner: &dyn ContentCloner,
) -> Result<(Store, CommandOutcome)> {
    let outcome = state.transaction(|tx| execute(tx, cmd, cloner))?;
    Ok((state, outcome))
}

fn execute(store: &mut Store, cmd: Command, cloner: &dyn ContentCloner) -> Result<CommandOutcome> {
    match cmd {
        Command::EntityCreate { content } => {
            entity_ops::create_entity(store, content).map(CommandOutcome::EntityCreated)
        }

        Command::EntityUpdate { entity_id, patch } => {
            entity_ops::update_entity(store, entity_id, patch)?;
            Ok(CommandOutcome::EntityUpdated(entity_id))
        }

        Command::EntityDelete { entity_id } => {
            entity_ops::delete_entity(store, entity_id).map(CommandOutcome::EntityDeleted)
        }

        Command::PlaceholderCreate {
            entity_id,
            slot,
            role,
            title,
        } => content_ops::create_placeholder(store, entity_id, &slot, role, title)
            .map(CommandOutcome::PlaceholderCreated),

        Command::PlaceholderUpdate {
            placeholder_id,
            title,
            role,
        } => {
            content_ops::update_placeholder(store, placeholder_id, title, role)?;
            Ok(CommandOutcome::PlaceholderUpdated(placeholder_id))
        }

        Command::ContentItemCreate {
            entity_id,
            slot,
            plugin,
            payload,
        } => content_ops::create_content_instance(store, entity_id, &slot, &plugin, payload)
            .map(CommandOutcome::ContentItemCreated),

        Command::ContentItemUpdate { item_id, payload } => {
            content_ops::update_content_item(store, item_id, payload)?;
            Ok(CommandOutcome::ContentItemUpdated(item_id))
        }

        Command::ContentItemDelete { item_id } => {
            content_ops::delete_content_item(store, item_id)?;
            Ok(CommandOutcome::ContentItemDeleted(item_id))
        }

        Command::Publish { entity_id } => {
            publish(store, entity_id, cloner).map(CommandOutcome::Published)
        }

        Command::Unpublish { entity_id } => {
            unpublish(store, entity_id).map(CommandOutcome::Unpublished)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QuireError;
    use crate::model::EntityContent;
    use crate::policy::PluginContentCloner;

    #[test]
    fn test_apply_journals_created_rows() {
        let cmd = Command::EntityCreate {
            content: EntityContent::new("Hello", "hello"),
        };
        let (state, outcome) = apply(Store::new(), cmd, &PluginContentCloner).unwrap();
        let CommandOutcome::EntityCreated(id) = outcome else {
            panic!("unexpected outcome {:?}", outcome);
        };
        assert!(state.changes().upserted_entities.contains(&id));
    }

    #[test]
    fn test_apply_update_unknown_entity_fails() {
        let cmd = Command::EntityUpdate {
            entity_id: 99,
            patch: entity_ops::EntityPatch::title("Nope"),
        };
        let result = apply(Store::new(), cmd, &PluginContentCloner);
        assert!(matches!(result, Err(QuireError::EntityNotFound { entity_id: 99 })));
    }
}
