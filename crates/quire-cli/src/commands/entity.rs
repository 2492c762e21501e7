//! Entity and content commands

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand, ValueEnum};
use quire_core::ops::entity_ops::EntityPatch;
use quire_core::{Command, CommandOutcome, EntityContent};
use quire_engine::{apply_engine_query, EngineQuery, EngineQueryResult, ListScope};

use super::{parse_field, run_command, CliResult, GlobalArgs};

#[derive(Debug, Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// Create a new draft
    Create(CreateArgs),
    /// Edit a draft
    Update(UpdateArgs),
    /// Delete a draft together with its published copy
    Delete { id: u64 },
    /// Print an entity as JSON
    Show { id: u64 },
    /// Print entities as JSON, in id order
    List {
        #[arg(long, value_enum, default_value_t = Scope::All)]
        scope: Scope,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Scope {
    All,
    Drafts,
    Published,
}

impl From<Scope> for ListScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::All => ListScope::All,
            Scope::Drafts => ListScope::Drafts,
            Scope::Published => ListScope::Published,
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub slug: String,

    /// Extra content field as key=<json>, repeatable
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Start of the publication window (RFC 3339)
    #[arg(long)]
    pub publication_date: Option<DateTime<Utc>>,

    /// End of the publication window (RFC 3339), exclusive
    #[arg(long)]
    pub publication_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: u64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub slug: Option<String>,

    /// Field to set as key=<json>; key=null removes it
    #[arg(long = "field")]
    pub fields: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ContentArgs {
    #[command(subcommand)]
    pub command: ContentCommand,
}

#[derive(Debug, Subcommand)]
pub enum ContentCommand {
    /// Append a content block to a slot, creating the placeholder if needed
    Add {
        entity_id: u64,
        #[arg(long, default_value = "main")]
        slot: String,
        #[arg(long)]
        plugin: String,
        /// JSON payload
        #[arg(long, default_value = "{}")]
        payload: String,
    },
    /// Replace a content block's payload
    Update {
        item_id: u64,
        #[arg(long)]
        payload: String,
    },
    /// Remove a content block
    Delete { item_id: u64 },
}

pub fn execute(global: &GlobalArgs, args: EntityArgs) -> CliResult<()> {
    match args.command {
        EntityCommand::Create(create) => {
            let mut content = EntityContent::new(create.title, create.slug);
            for raw in &create.fields {
                let (key, value) = parse_field(raw)?;
                content = content.with_field(key, value);
            }
            content.publication_date = create.publication_date;
            content.publication_end_date = create.publication_end_date;

            match run_command(global, Command::EntityCreate { content })? {
                CommandOutcome::EntityCreated(id) => println!("Created draft {}", id),
                other => println!("{:?}", other),
            }
        }
        EntityCommand::Update(update) => {
            let mut patch = EntityPatch {
                title: update.title,
                slug: update.slug,
                ..EntityPatch::default()
            };
            for raw in &update.fields {
                let (key, value) = parse_field(raw)?;
                patch.fields.insert(key, value);
            }
            run_command(
                global,
                Command::EntityUpdate {
                    entity_id: update.id,
                    patch,
                },
            )?;
            println!("Updated draft {}", update.id);
        }
        EntityCommand::Delete { id } => {
            if let CommandOutcome::EntityDeleted(ids) =
                run_command(global, Command::EntityDelete { entity_id: id })?
            {
                let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
                println!("Deleted {}", ids.join(", "));
            }
        }
        EntityCommand::Show { id } => {
            let conn = global.open_db()?;
            if let EngineQueryResult::Entity(view) =
                apply_engine_query(EngineQuery::EntityGet { entity_id: id }, &conn)?
            {
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
        }
        EntityCommand::List { scope } => {
            let conn = global.open_db()?;
            if let EngineQueryResult::EntityList(views) = apply_engine_query(
                EngineQuery::EntityList {
                    scope: scope.into(),
                },
                &conn,
            )? {
                println!("{}", serde_json::to_string_pretty(&views)?);
            }
        }
    }
    Ok(())
}

pub fn execute_content(global: &GlobalArgs, args: ContentArgs) -> CliResult<()> {
    match args.command {
        ContentCommand::Add {
            entity_id,
            slot,
            plugin,
            payload,
        } => {
            let payload = serde_json::from_str(&payload)?;
            if let CommandOutcome::ContentItemCreated(item_id) = run_command(
                global,
                Command::ContentItemCreate {
                    entity_id,
                    slot,
                    plugin,
                    payload,
                },
            )? {
                println!("Created content item {}", item_id);
            }
        }
        ContentCommand::Update { item_id, payload } => {
            let payload = serde_json::from_str(&payload)?;
            run_command(global, Command::ContentItemUpdate { item_id, payload })?;
            println!("Updated content item {}", item_id);
        }
        ContentCommand::Delete { item_id } => {
            run_command(global, Command::ContentItemDelete { item_id })?;
            println!("Deleted content item {}", item_id);
        }
    }
    Ok(())
}
