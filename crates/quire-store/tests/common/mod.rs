#![allow(dead_code)]

use quire_core::ops::{content_ops, entity_ops};
use quire_core::{EntityContent, Store};
use rusqlite::Connection;
use serde_json::json;

pub fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    quire_store::db::configure(&conn).unwrap();
    quire_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

/// Draft with one placeholder holding two rawhtml items
pub fn seeded_draft(store: &mut Store, title: &str, slug: &str) -> u64 {
    let id = entity_ops::create_entity(
        store,
        EntityContent::new(title, slug).with_field("summary", json!("a page")),
    )
    .unwrap();
    content_ops::create_content_instance(store, id, "main", "rawhtml", json!({"html": "<b>ping</b>"}))
        .unwrap();
    content_ops::create_content_instance(store, id, "main", "rawhtml", json!({"html": "<b>pong</b>"}))
        .unwrap();
    id
}

/// Apply `f` to the persisted state and write its journal back
pub fn mutate<T>(conn: &mut Connection, f: impl FnOnce(&mut Store) -> T) -> T {
    let tx = conn.transaction().unwrap();
    let mut store = quire_store::load_store(&tx).unwrap();
    let value = f(&mut store);
    let changes = store.take_changes();
    quire_store::SqliteRepo::persist_changes(&tx, &store, &changes).unwrap();
    tx.commit().unwrap();
    value
}
