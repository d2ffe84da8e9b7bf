//! End-to-end tests against a real hub over HTTP and WebSockets.
//!
//! Spins up the hub on an ephemeral port, connects production channels to
//! it, and drives full board flows between sessions across the wire.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::similar_names)]

use std::time::Duration;

use tokio::sync::mpsc;

use syncboard::board::StoreChange;
use syncboard::session::BoardSession;
use syncboard::sync::{HttpApi, SyncChannel, SyncConfig, WsLink};
use syncboard_hub::server::start_server;
use syncboard_proto::api::NewUser;
use syncboard_proto::task::{Category, TaskDraft};

type WireSession = BoardSession<HttpApi, WsLink>;
type ChangeFeed = mpsc::UnboundedReceiver<StoreChange>;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Starts a hub on an ephemeral port and returns a channel config
/// pointing at it.
async fn start_hub() -> SyncConfig {
    let (addr, _handle) = start_server("127.0.0.1:0").await.expect("hub should start");
    SyncConfig::new(format!("http://{addr}"), format!("ws://{addr}/ws"))
}

/// Connects a production channel and opens a session for `uid`,
/// consuming the initial full-load notification.
async fn open_session(config: &SyncConfig, uid: &str) -> (WireSession, ChangeFeed) {
    let channel = SyncChannel::connect(config)
        .await
        .expect("channel should connect");
    let profile = NewUser::new(uid, format!("{uid}@example.com"), uid.to_uppercase());
    let (session, mut changes) = BoardSession::open(profile, channel)
        .await
        .expect("session should open");
    let first = next_change(&mut changes).await;
    assert!(
        matches!(first, StoreChange::Replaced),
        "expected the initial load, got {first:?}"
    );
    (session, changes)
}

/// Receives the next store change, panicking if none arrives in time.
async fn next_change(changes: &mut ChangeFeed) -> StoreChange {
    tokio::time::timeout(Duration::from_secs(5), changes.recv())
        .await
        .expect("timed out waiting for a store change")
        .expect("change feed closed")
}

/// Pumps the change feed until `pred` matches, discarding everything else.
async fn await_change(changes: &mut ChangeFeed, mut pred: impl FnMut(&StoreChange) -> bool) {
    loop {
        let change = next_change(changes).await;
        if pred(&change) {
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_sessions_converge_over_the_wire() {
    let config = start_hub().await;
    let (a, mut a_changes) = open_session(&config, "user-1").await;
    let (b, mut b_changes) = open_session(&config, "user-1").await;

    // Create on a, observe on b.
    let task = a
        .mutator()
        .add_task(&TaskDraft::new("Cross the wire", None))
        .await
        .expect("add should succeed");
    await_change(&mut b_changes, |change| {
        matches!(change, StoreChange::Upserted(seen) if seen.id == task.id)
    })
    .await;
    assert_eq!(a.store().list(), b.store().list());

    // Edit on b, observe on a.
    b.mutator()
        .edit_task(&task.id, &TaskDraft::new("Crossed the wire", None))
        .await
        .expect("edit should succeed");
    await_change(&mut a_changes, |change| {
        matches!(change, StoreChange::Upserted(seen)
            if seen.id == task.id && seen.title == "Crossed the wire")
    })
    .await;

    // Move on a, observe on b.
    a.mutator()
        .move_task(&task.id, Category::Todo, 0, Category::Done, 0)
        .await
        .expect("move should succeed");
    await_change(&mut b_changes, |change| {
        matches!(change, StoreChange::Upserted(seen)
            if seen.id == task.id && seen.category == Category::Done)
    })
    .await;

    // Delete on b, observe on a.
    b.mutator()
        .delete_task(&task.id)
        .await
        .expect("delete should succeed");
    await_change(&mut a_changes, |change| {
        matches!(change, StoreChange::Removed(gone) if *gone == task.id)
    })
    .await;

    assert!(a.store().is_empty());
    assert!(b.store().is_empty());
}

#[tokio::test]
async fn late_joiner_loads_the_board_from_the_hub() {
    let config = start_hub().await;
    let (a, _a_changes) = open_session(&config, "user-1").await;

    for title in ["Plan the sprint", "Groom the backlog"] {
        a.mutator()
            .add_task(&TaskDraft::new(title, None))
            .await
            .expect("add should succeed");
    }

    let (b, _b_changes) = open_session(&config, "user-1").await;
    assert_eq!(b.store().list(), a.store().list());
    assert_eq!(b.store().len(), 2);
}

#[tokio::test]
async fn peer_disconnect_does_not_break_the_board() {
    let config = start_hub().await;
    let (a, _a_changes) = open_session(&config, "user-1").await;
    let (b, _b_changes) = open_session(&config, "user-1").await;
    b.close();

    // The hub drops the dead client on its own; a keeps working.
    let task = a
        .mutator()
        .add_task(&TaskDraft::new("Still alive", None))
        .await
        .expect("add should succeed");
    assert!(a.is_live());

    let (c, _c_changes) = open_session(&config, "user-1").await;
    assert!(c.store().contains(&task.id));
}

#[tokio::test]
async fn moves_persist_across_a_resync() {
    let config = start_hub().await;
    let (a, _a_changes) = open_session(&config, "user-1").await;

    let first = a
        .mutator()
        .add_task(&TaskDraft::new("First", None))
        .await
        .expect("add should succeed");
    let second = a
        .mutator()
        .add_task(&TaskDraft::new("Second", None))
        .await
        .expect("add should succeed");

    a.mutator()
        .move_task(&second.id, Category::Todo, 1, Category::Done, 0)
        .await
        .expect("move should succeed");

    // A wholesale refetch returns what the hub persisted.
    a.resync().await.expect("resync should succeed");
    let moved = a.store().get(&second.id).expect("moved task survives");
    assert_eq!(moved.category, Category::Done);
    assert_eq!(moved.position, 0);
    let kept = a.store().get(&first.id).expect("first task survives");
    assert_eq!(kept.category, Category::Todo);
    assert_eq!(kept.position, 0);
}
