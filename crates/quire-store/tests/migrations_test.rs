// Integration tests for the migration framework

use rusqlite::Connection;

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn test_apply_migrations_on_empty_db() {
    // Given: An empty SQLite database
    let mut conn = Connection::open_in_memory().unwrap();

    // When: Migrations are applied
    let result = quire_store::migrations::apply_migrations(&mut conn);

    // Then: All expected tables exist
    assert!(result.is_ok(), "Migrations should succeed: {:?}", result.err());
    let tables = table_names(&conn);
    for expected in [
        "content_items",
        "entities",
        "placeholders",
        "schema_version",
        "sequences",
        "settings",
    ] {
        assert!(tables.contains(&expected.to_string()), "Missing table: {}", expected);
    }
}

#[test]
fn test_edited_migration_is_rejected() {
    // Given: A migrated database whose recorded checksum no longer matches
    let mut conn = Connection::open_in_memory().unwrap();
    quire_store::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "UPDATE schema_version SET checksum = 'tampered' WHERE migration_id = '001_versioning_schema'",
        [],
    )
    .unwrap();

    // When: Migrations are applied again
    let err = quire_store::migrations::apply_migrations(&mut conn).unwrap_err();

    // Then: The checksum mismatch is reported
    assert_eq!(err.code(), "ERR_PERSISTENCE");
    assert_eq!(err.op(), Some("migration_checksum"));
}

#[test]
fn test_unknown_applied_migration_is_rejected() {
    // Given: A database that records a migration this build lacks
    let mut conn = Connection::open_in_memory().unwrap();
    quire_store::migrations::apply_migrations(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES ('999_future', 0, NULL)",
        [],
    )
    .unwrap();

    // When / Then
    let err = quire_store::migrations::apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.op(), Some("migration"));
    assert!(err.message().contains("999_future"));
}

#[test]
fn test_linked_id_must_reference_existing_entity() {
    // Given: A migrated database with foreign keys on
    let conn = {
        let mut conn = Connection::open_in_memory().unwrap();
        quire_store::db::configure(&conn).unwrap();
        quire_store::migrations::apply_migrations(&mut conn).unwrap();
        conn
    };

    // When: A row links to a missing counterpart outside a deferred transaction
    let result = conn.execute(
        "INSERT INTO entities (id, title, slug, is_draft, linked_id, created_at, modified_at)
         VALUES (1, 'Orphan', 'orphan', 1, 42, 0, 0)",
        [],
    );

    // Then: The deferred check fails at statement commit
    assert!(result.is_err());
}
