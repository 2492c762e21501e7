//! CLI integration tests
//!
//! Drive the `quire` binary against a scratch database and check both its
//! output and the rows it leaves behind.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn db_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("quire.db")
}

fn quire(db: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_quire"))
        .arg("--db")
        .arg(db)
        .args(args)
        .env_remove("QUIRE_CONFIG")
        .env_remove("QUIRE_LOG")
        .env_remove("QUIRE_EDIT_PARAM")
        .env_remove("QUIRE_TRACE_ID")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "CLI command should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_create_publish_and_serve() {
    // GIVEN a fresh database
    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);

    // WHEN a draft is created, filled and published
    let created = stdout(&quire(&db, &["entity", "create", "--title", "About", "--slug", "about"]));
    assert!(created.contains("Created draft 1"));
    stdout(&quire(
        &db,
        &["content", "add", "1", "--plugin", "rawhtml", "--payload", r#"{"html":"<b>hi</b>"}"#],
    ));
    let published = stdout(&quire(&db, &["publish", "1"]));

    // THEN the copy exists and the public page renders it
    assert!(published.contains("Published draft 1 as 2"));
    let served = stdout(&quire(&db, &["serve-path", "/about/"]));
    assert!(served.starts_with("200"));
    assert!(served.contains("<b>hi</b>"));

    let conn = Connection::open(&db).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entities WHERE is_draft = 0", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_staff_redirect_and_signed_preview() {
    // GIVEN an unpublished draft
    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);
    stdout(&quire(&db, &["entity", "create", "--title", "Soon", "--slug", "soon"]));

    // WHEN staff request the public page
    let served = stdout(&quire(&db, &["serve-path", "/soon/", "--as", "staff"]));

    // THEN they are redirected to a signed URL that anonymous visitors can open
    assert!(served.starts_with("302"));
    let location = served
        .lines()
        .find_map(|line| line.strip_prefix("Location: "))
        .unwrap()
        .to_string();
    let verified = stdout(&quire(&db, &["url", "verify", &location]));
    assert_eq!(verified.trim(), "valid");
    let preview = stdout(&quire(&db, &["serve-path", &location]));
    assert!(preview.starts_with("200"));
    let public = stdout(&quire(&db, &["serve-path", "/soon/"]));
    assert!(public.starts_with("404"));
}

#[test]
fn test_rotate_invalidates_signed_url() {
    // GIVEN a signed URL
    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);
    let signed = stdout(&quire(&db, &["url", "sign", "/about/?lang=en"]));
    let signed = signed.trim();
    assert!(signed.contains("lang=en"));

    // WHEN the secret is rotated
    stdout(&quire(&db, &["secret", "rotate"]));

    // THEN verification fails with a non-zero exit
    let output = quire(&db, &["url", "verify", signed]);
    assert!(!output.status.success());
}

#[test]
fn test_update_published_copy_fails() {
    // GIVEN a published draft
    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);
    stdout(&quire(&db, &["entity", "create", "--title", "About", "--slug", "about"]));
    stdout(&quire(&db, &["publish", "1"]));

    // WHEN the published copy is edited
    let output = quire(&db, &["entity", "update", "2", "--title", "Hacked"]);

    // THEN the CLI reports the draft-only rule
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_NOT_DRAFT"));
}

#[test]
fn test_list_and_show_report_status() {
    // GIVEN a published then edited draft
    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);
    stdout(&quire(&db, &["entity", "create", "--title", "About", "--slug", "about", "--field", "rank=3"]));
    stdout(&quire(&db, &["publish", "1"]));
    stdout(&quire(&db, &["entity", "update", "1", "--title", "About us"]));

    // WHEN it is inspected
    let shown: serde_json::Value =
        serde_json::from_str(&stdout(&quire(&db, &["entity", "show", "1"]))).unwrap();
    let drafts: serde_json::Value =
        serde_json::from_str(&stdout(&quire(&db, &["entity", "list", "--scope", "drafts"]))).unwrap();

    // THEN status flags and fields are reported
    assert_eq!(shown["is_dirty"], serde_json::json!(true));
    assert_eq!(shown["has_been_published"], serde_json::json!(true));
    assert_eq!(shown["fields"]["rank"], serde_json::json!(3));
    assert_eq!(drafts.as_array().unwrap().len(), 1);
}

#[test]
fn test_delete_cascades_to_published_copy() {
    // GIVEN a published draft
    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);
    stdout(&quire(&db, &["entity", "create", "--title", "About", "--slug", "about"]));
    stdout(&quire(&db, &["publish", "1"]));

    // WHEN the draft is deleted
    let deleted = stdout(&quire(&db, &["entity", "delete", "1"]));

    // THEN both rows are gone
    assert!(deleted.contains("Deleted 1, 2"));
    let conn = Connection::open(&db).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_serve_path_logs_upstream_trace_id() {
    // GIVEN a published page
    let temp_dir = TempDir::new().unwrap();
    let db = db_path(&temp_dir);
    stdout(&quire(&db, &["entity", "create", "--title", "Traced", "--slug", "traced"]));
    stdout(&quire(&db, &["publish", "1"]));

    // WHEN it is served with an upstream trace id and logging on
    let output = quire(
        &db,
        &["--log", "development", "serve-path", "/traced/", "--trace-id", "trace-abc"],
    );

    // THEN the response is unchanged and the gate log carries the trace
    assert!(stdout(&output).starts_with("200"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("trace-abc"), "stderr: {}", stderr);
}
