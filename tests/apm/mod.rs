use mongo_bulk::apm::{CommandResult, CommandStarted, Listener};
use mongo_bulk::bulk::{BulkMixedWriteOperation, WriteRequest};
use mongo_bulk::coll::options::BulkWriteOptions;

use crate::mock::{acknowledge_all, scripted, MockConnection};

use std::sync::atomic::{AtomicUsize, Ordering};

static INSERTS_STARTED: AtomicUsize = AtomicUsize::new(0);
static INSERTS_SUCCEEDED: AtomicUsize = AtomicUsize::new(0);
static LEGACY_STARTED: AtomicUsize = AtomicUsize::new(0);
static FAILURES: AtomicUsize = AtomicUsize::new(0);

fn count_insert_started(started: &CommandStarted) {
    if started.command_name == "insert" && started.database_name == "apm" {
        assert!(started.command.contains_key("documents"));
        assert_eq!("mock:27017", started.connection_string);
        INSERTS_STARTED.fetch_add(1, Ordering::SeqCst);
    }
}

fn count_insert_succeeded(result: &CommandResult) {
    if let CommandResult::Success { ref command_name, ref reply, .. } = *result {
        if command_name == "insert" && reply.contains_key("n") {
            INSERTS_SUCCEEDED.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn count_legacy_started(started: &CommandStarted) {
    if started.database_name == "apm_legacy" && started.command.contains_key("update") {
        assert!(started.command.contains_key("q"));
        LEGACY_STARTED.fetch_add(1, Ordering::SeqCst);
    }
}

fn count_failures(result: &CommandResult) {
    if !result.is_success() && result.command_name() == "delete" {
        assert!(result.to_string().contains("FAILURE"));
        FAILURES.fetch_add(1, Ordering::SeqCst);
    }
}

fn inserts(count: usize) -> Vec<WriteRequest> {
    (0..count).map(|i| WriteRequest::insert(i, doc! { "_id": i as i32 })).collect()
}

#[test]
fn hooks_see_every_write_command() {
    let listener = Listener::new();
    listener.add_start_hook(count_insert_started).unwrap();
    listener.add_completion_hook(count_insert_succeeded).unwrap();

    let mut conn = MockConnection::modern(acknowledge_all);
    conn.listener = Some(listener);

    let options = BulkWriteOptions { max_batch_count: Some(2), ..Default::default() };
    BulkMixedWriteOperation::new("apm", "c", inserts(5), options).execute(&mut conn).unwrap();

    assert_eq!(3, INSERTS_STARTED.load(Ordering::SeqCst));
    assert_eq!(3, INSERTS_SUCCEEDED.load(Ordering::SeqCst));
}

#[test]
fn hooks_see_emulated_writes() {
    let listener = Listener::new();
    listener.add_start_hook(count_legacy_started).unwrap();

    let mut conn = MockConnection::legacy(acknowledge_all);
    conn.listener = Some(listener);

    let requests = vec![
        WriteRequest::update(0, doc! { "a": 1 }, doc! { "$set": { "b": 1 } }, None, None),
        WriteRequest::update(1, doc! { "a": 2 }, doc! { "$set": { "b": 1 } }, None, None),
    ];
    BulkMixedWriteOperation::new("apm_legacy", "c", requests, BulkWriteOptions::new())
        .execute(&mut conn)
        .unwrap();

    assert_eq!(2, LEGACY_STARTED.load(Ordering::SeqCst));
}

#[test]
fn failed_commands_are_reported() {
    let listener = Listener::new();
    listener.add_completion_hook(count_failures).unwrap();

    let mut conn = MockConnection::modern(scripted(vec![doc! { "ok": 0, "errmsg": "not master" }]));
    conn.listener = Some(listener);

    let requests = vec![WriteRequest::delete(0, doc! {}, 0)];
    assert!(BulkMixedWriteOperation::new("apm_fail", "c", requests, BulkWriteOptions::new())
        .execute(&mut conn)
        .is_err());

    assert_eq!(1, FAILURES.load(Ordering::SeqCst));
}

#[test]
fn listener_without_hooks_is_inert() {
    let mut conn = MockConnection::modern(acknowledge_all);
    conn.listener = Some(Listener::new());

    let result = BulkMixedWriteOperation::new("apm_none", "c", inserts(1), BulkWriteOptions::new())
        .execute(&mut conn)
        .unwrap();
    assert_eq!(1, result.inserted_count);
}
