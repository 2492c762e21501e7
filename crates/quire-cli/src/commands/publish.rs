//! Publish and unpublish commands

use clap::Args;
use quire_core::{Command, CommandOutcome};

use super::{run_command, CliResult, GlobalArgs};

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Draft entity id
    pub id: u64,
}

pub fn execute_publish(global: &GlobalArgs, args: PublishArgs) -> CliResult<()> {
    if let CommandOutcome::Published(outcome) =
        run_command(global, Command::Publish { entity_id: args.id })?
    {
        let verb = if outcome.created { "Published" } else { "Republished" };
        println!(
            "{} draft {} as {} ({} placeholders, {} items)",
            verb,
            outcome.draft_id,
            outcome.published_id,
            outcome.cloned_placeholders,
            outcome.cloned_items
        );
    }
    Ok(())
}

pub fn execute_unpublish(global: &GlobalArgs, args: PublishArgs) -> CliResult<()> {
    match run_command(global, Command::Unpublish { entity_id: args.id })? {
        CommandOutcome::Unpublished(Some(removed)) => {
            println!("Unpublished draft {} (removed {})", args.id, removed)
        }
        _ => println!("Draft {} was not published", args.id),
    }
    Ok(())
}
