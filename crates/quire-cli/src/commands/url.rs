//! Draft preview URL and secret commands

use clap::{Args, Subcommand};
use quire_core::signing::DraftUrlSigner;
use quire_core::PluginContentCloner;
use quire_engine::{apply_engine_command, EngineCommand};
use quire_store::SqliteSecretStore;

use super::{CliResult, GlobalArgs};

#[derive(Debug, Args)]
pub struct UrlArgs {
    #[command(subcommand)]
    pub command: UrlCommand,
}

#[derive(Debug, Subcommand)]
pub enum UrlCommand {
    /// Attach a draft preview token to a URL or path
    Sign { url: String },
    /// Check a URL's draft preview token; exits 1 when invalid
    Verify { url: String },
}

#[derive(Debug, Args)]
pub struct SecretArgs {
    #[command(subcommand)]
    pub command: SecretCommand,
}

#[derive(Debug, Subcommand)]
pub enum SecretCommand {
    /// Replace the secret, invalidating every outstanding preview link
    Rotate,
}

pub fn execute(global: &GlobalArgs, args: UrlArgs) -> CliResult<()> {
    let conn = global.open_db()?;
    let secrets = SqliteSecretStore::new(&conn);
    let signer = DraftUrlSigner::new(&secrets, global.load_config()?);

    match args.command {
        UrlCommand::Sign { url } => println!("{}", signer.sign(&url)?),
        UrlCommand::Verify { url } => {
            if signer.verify(&url) {
                println!("valid");
            } else {
                return Err("invalid draft token".into());
            }
        }
    }
    Ok(())
}

pub fn execute_secret(global: &GlobalArgs, args: SecretArgs) -> CliResult<()> {
    match args.command {
        SecretCommand::Rotate => {
            let mut conn = global.open_db()?;
            apply_engine_command(
                EngineCommand::RotateSecret,
                &mut conn,
                &PluginContentCloner,
                &global.load_config()?,
            )?;
            println!("Secret rotated; previous preview links are no longer valid");
        }
    }
    Ok(())
}
