//! Quire CLI
//!
//! Command-line interface for the draft/publish engine

use clap::{Parser, Subcommand};
use quire_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "quire")]
#[command(about = "Quire - draft/publish content versioning", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: commands::GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Draft entity operations
    Entity(commands::entity::EntityArgs),
    /// Content block operations on a draft
    Content(commands::entity::ContentArgs),
    /// Publish a draft
    Publish(commands::publish::PublishArgs),
    /// Withdraw a draft's published copy
    Unpublish(commands::publish::PublishArgs),
    /// Draft preview URLs
    Url(commands::url::UrlArgs),
    /// Draft preview secret management
    Secret(commands::url::SecretArgs),
    /// Serve one request through the publishing gate
    ServePath(commands::serve::ServePathArgs),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let profile = cli
        .global
        .log
        .as_deref()
        .map(str::parse::<Profile>)
        .transpose();
    match profile {
        Ok(Some(profile)) => logging_facility::init(profile),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }

    let result = match cli.command {
        Commands::Entity(args) => commands::entity::execute(&cli.global, args),
        Commands::Content(args) => commands::entity::execute_content(&cli.global, args),
        Commands::Publish(args) => commands::publish::execute_publish(&cli.global, args),
        Commands::Unpublish(args) => commands::publish::execute_unpublish(&cli.global, args),
        Commands::Url(args) => commands::url::execute(&cli.global, args),
        Commands::Secret(args) => commands::url::execute_secret(&cli.global, args),
        Commands::ServePath(args) => commands::serve::execute(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
