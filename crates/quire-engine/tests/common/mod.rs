#![allow(dead_code)]

use quire_core::{Command, CommandOutcome, EntityContent, PluginContentCloner, PublishingConfig, User};
use quire_engine::{apply_engine_command, EngineCommand, EngineCommandResult};
use rusqlite::Connection;
use serde_json::json;

pub fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    quire_store::db::configure(&conn).unwrap();
    quire_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

pub fn run(conn: &mut Connection, cmd: Command) -> CommandOutcome {
    match apply_engine_command(
        EngineCommand::Kernel(cmd),
        conn,
        &PluginContentCloner,
        &PublishingConfig::default(),
    )
    .unwrap()
    {
        EngineCommandResult::Kernel(outcome) => outcome,
        other => panic!("unexpected result {:?}", other),
    }
}

/// Draft page with one rawhtml block
pub fn create_page(conn: &mut Connection, title: &str, slug: &str) -> u64 {
    let id = match run(
        conn,
        Command::EntityCreate {
            content: EntityContent::new(title, slug),
        },
    ) {
        CommandOutcome::EntityCreated(id) => id,
        other => panic!("unexpected outcome {:?}", other),
    };
    run(
        conn,
        Command::ContentItemCreate {
            entity_id: id,
            slot: "main".to_string(),
            plugin: "rawhtml".to_string(),
            payload: json!({"html": format!("<b>{}</b>", title)}),
        },
    );
    id
}

pub fn staff() -> Option<User> {
    Some(User::staff(1, "staff"))
}

pub fn reviewer() -> Option<User> {
    Some(User::new(2, "reviewer").with_group("Content Reviewers"))
}
