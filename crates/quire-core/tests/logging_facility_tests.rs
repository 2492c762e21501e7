#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{create_draft, new_store, FailingCloner};
use quire_core::errors::QuireError;
use quire_core::logging_facility::test_capture::init_test_capture;
use quire_core::ops::content_ops;
use quire_core::quire_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use quire_core::{log_op_end, log_op_error, log_op_start, publish, unpublish, PluginContentCloner};
use serde_json::json;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    log_op_error!(op_name, QuireError::NotDraft { entity_id: 5 }, duration_ms = 1);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field("err.code"), Some("ERR_NOT_DRAFT"));
}

#[test]
fn test_publish_logs_start_and_end_with_counts() {
    let capture = init_test_capture();
    let mut store = new_store();
    let id = create_draft(&mut store, "Logged", "logged");
    content_ops::create_content_instance(&mut store, id, "main", "text", json!({})).unwrap();

    let outcome = publish(&mut store, id, &PluginContentCloner).unwrap();

    let published_id = outcome.published_id.to_string();
    let ends: Vec<_> = capture
        .events_for_op("publish")
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .filter(|e| e.field("published_id") == Some(published_id.as_str()))
        .collect();
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].field("cloned_items"), Some("1"));
    capture.assert_event_exists("publish", EVENT_START);
}

#[test]
fn test_failed_publish_logs_transaction_failure() {
    let capture = init_test_capture();
    let mut store = new_store();
    let id = create_draft(&mut store, "Doomed", "doomed");
    content_ops::create_content_instance(&mut store, id, "main", "text", json!({"fail": true}))
        .unwrap();

    assert!(publish(&mut store, id, &FailingCloner).is_err());

    let count = capture.count_events(|e| {
        e.op.as_deref() == Some("publish")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field("err.code") == Some("ERR_TRANSACTION_FAILED")
    });
    assert!(count >= 1);
}

#[test]
fn test_unpublish_logs_boundary() {
    let capture = init_test_capture();
    let mut store = new_store();
    let id = create_draft(&mut store, "Retracted", "retracted");
    publish(&mut store, id, &PluginContentCloner).unwrap();

    unpublish(&mut store, id).unwrap();

    capture.assert_event_exists("unpublish", EVENT_START);
    capture.assert_event_exists("unpublish", EVENT_END);
}
