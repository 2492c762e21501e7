//! Subcommand implementations and shared plumbing

pub mod entity;
pub mod publish;
pub mod serve;
pub mod url;

use clap::Args;
use quire_core::{Command, CommandOutcome, PluginContentCloner, PublishingConfig};
use quire_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use rusqlite::Connection;
use std::path::Path;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// SQLite database file
    #[arg(long, global = true, env = "QUIRE_DB", default_value = ".quire/quire.db")]
    pub db: String,

    /// TOML file with publishing settings
    #[arg(long, global = true, env = "QUIRE_CONFIG")]
    pub config: Option<String>,

    /// Logging profile (development, production); logs go to stderr
    #[arg(long, global = true, env = "QUIRE_LOG")]
    pub log: Option<String>,
}

impl GlobalArgs {
    /// Open the database, creating and migrating it on first use
    pub fn open_db(&self) -> CliResult<Connection> {
        if let Some(parent) = Path::new(&self.db).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(quire_store::db::open_and_migrate(&self.db)?)
    }

    /// File settings (or defaults) with `QUIRE_*` environment overrides
    pub fn load_config(&self) -> CliResult<PublishingConfig> {
        let config = match &self.config {
            Some(path) => PublishingConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => PublishingConfig::default(),
        };
        Ok(config.with_env_overrides()?)
    }
}

/// Run one kernel command through the engine
pub fn run_command(global: &GlobalArgs, cmd: Command) -> CliResult<CommandOutcome> {
    let mut conn = global.open_db()?;
    let config = global.load_config()?;
    match apply_engine_command(
        EngineCommand::Kernel(cmd),
        &mut conn,
        &PluginContentCloner,
        &config,
    )? {
        EngineCommandResult::Kernel(outcome) => Ok(outcome),
        other => Err(format!("unexpected engine result {:?}", other).into()),
    }
}

/// Parse `key=<json>`; a value that is not JSON is taken as a string
pub fn parse_field(raw: &str) -> CliResult<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
