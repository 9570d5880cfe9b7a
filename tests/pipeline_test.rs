//! End-to-end pipeline tests: create → complete → partner fan-out.
//!
//! All tests run against in-memory storage — no daemon process required.

use std::sync::Arc;

use tandemd::directory::Directory;
use tandemd::error::PipelineError;
use tandemd::ipc::event::EventBroadcaster;
use tandemd::notify::dispatcher::Dispatcher;
use tandemd::notify::storage::NotificationStorage;
use tandemd::storage::Storage;
use tandemd::tasks::lifecycle::LifecycleCoordinator;
use tandemd::tasks::storage::TaskStorage;

// ─── Helpers ─────────────────────────────────────────────────────────────────

struct World {
    storage: Storage,
    user_a: String,
    user_b: String,
}

/// Two users, A and B, linked as partners.
async fn linked_world() -> World {
    let storage = Storage::memory().await.unwrap();
    let dir = Directory::new(storage.pool());
    let a = dir.create_user("A").await.unwrap();
    let b = dir.create_user("B").await.unwrap();
    dir.link_partners(&a.id, &b.id).await.unwrap();
    World {
        storage,
        user_a: a.id,
        user_b: b.id,
    }
}

// ─── End-to-end scenario ──────────────────────────────────────────────────────

/// User A (partner B) creates a task, then completes it: the task carries a
/// completion timestamp and exactly one `completion` record exists for B
/// referencing the task id.
#[tokio::test]
async fn complete_task_notifies_linked_partner() {
    let w = linked_world().await;
    let tasks = TaskStorage::new(w.storage.pool());

    let task = tasks
        .create(&w.user_a, "빨래 널기", None, "2026-08-09T19:00:00+09:00")
        .await
        .unwrap();
    assert!(!task.completed);
    assert!(task.completed_at.is_none());

    let coord = LifecycleCoordinator::new(w.storage.pool(), None);
    let outcome = coord.complete_task(&task.id, &w.user_a).await.unwrap();

    assert!(outcome.task.completed);
    assert!(outcome.task.completed_at.is_some());
    assert_eq!(outcome.notified.as_deref(), Some(w.user_b.as_str()));

    let records = NotificationStorage::new(w.storage.pool())
        .list_for_recipient(&w.user_b, 10)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].task_id, task.id);
    assert_eq!(records[0].kind, "completion");
    assert!(records[0].message.contains("빨래 널기"));
}

// ─── Idempotence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn completing_twice_is_stable_and_creates_one_record() {
    let w = linked_world().await;
    let tasks = TaskStorage::new(w.storage.pool());
    let task = tasks
        .create(&w.user_a, "설거지하기", None, "2026-08-09T19:00:00Z")
        .await
        .unwrap();

    let coord = LifecycleCoordinator::new(w.storage.pool(), None);
    let first = coord.complete_task(&task.id, &w.user_a).await.unwrap();
    let second = coord.complete_task(&task.id, &w.user_a).await.unwrap();

    assert_eq!(first.task.completed_at, second.task.completed_at);
    assert!(first.transitioned);
    assert!(!second.transitioned);

    let records = NotificationStorage::new(w.storage.pool())
        .list_for_task(&task.id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

// ─── Ownership ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn partner_cannot_complete_the_owners_task() {
    let w = linked_world().await;
    let tasks = TaskStorage::new(w.storage.pool());
    let task = tasks
        .create(&w.user_a, "청소기 돌리기", None, "2026-08-09T19:00:00Z")
        .await
        .unwrap();

    let coord = LifecycleCoordinator::new(w.storage.pool(), None);
    let err = coord.complete_task(&task.id, &w.user_b).await.unwrap_err();
    assert!(matches!(err, PipelineError::Forbidden { .. }));

    // No mutation, no record.
    assert!(!tasks.get(&task.id).await.unwrap().completed);
    assert!(NotificationStorage::new(w.storage.pool())
        .list_for_task(&task.id)
        .await
        .unwrap()
        .is_empty());
}

// ─── No-partner path ─────────────────────────────────────────────────────────

#[tokio::test]
async fn completion_without_a_partner_creates_no_records() {
    let storage = Storage::memory().await.unwrap();
    let solo = Directory::new(storage.pool())
        .create_user("solo")
        .await
        .unwrap();
    let task = TaskStorage::new(storage.pool())
        .create(&solo.id, "혼자 할 일", None, "2026-08-09T19:00:00Z")
        .await
        .unwrap();

    let coord = LifecycleCoordinator::new(storage.pool(), None);
    let outcome = coord.complete_task(&task.id, &solo.id).await.unwrap();
    assert!(outcome.task.completed);
    assert!(outcome.notified.is_none());

    assert!(NotificationStorage::new(storage.pool())
        .list_for_recipient(&solo.id, 10)
        .await
        .unwrap()
        .is_empty());
}

// ─── Notification independence ───────────────────────────────────────────────

/// Even with a dispatcher whose backing store rejects every insert, the
/// caller still gets the completed task back.
#[tokio::test]
async fn completion_survives_a_dead_dispatcher() {
    let w = linked_world().await;
    let task = TaskStorage::new(w.storage.pool())
        .create(&w.user_a, "분리수거", None, "2026-08-09T19:00:00Z")
        .await
        .unwrap();

    let bare = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    let coord = LifecycleCoordinator::with_parts(
        TaskStorage::new(w.storage.pool()),
        Directory::new(w.storage.pool()),
        Dispatcher::new(bare, None),
    );

    let outcome = coord.complete_task(&task.id, &w.user_a).await.unwrap();
    assert!(outcome.task.completed);
    assert!(outcome.notified.is_none());
}

// ─── Live channel ────────────────────────────────────────────────────────────

/// A connected subscriber receives `notification.push` for the partner; the
/// record is persisted either way.
#[tokio::test]
async fn live_push_is_delivered_when_a_client_is_connected() {
    let w = linked_world().await;
    let task = TaskStorage::new(w.storage.pool())
        .create(&w.user_a, "쓰레기 버리기", None, "2026-08-09T19:00:00Z")
        .await
        .unwrap();

    let live = Arc::new(EventBroadcaster::new());
    let mut rx = live.subscribe();
    let coord = LifecycleCoordinator::new(w.storage.pool(), Some(live));

    coord.complete_task(&task.id, &w.user_a).await.unwrap();

    let raw = rx.recv().await.unwrap();
    let msg: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(msg["method"], "notification.push");
    assert_eq!(msg["params"]["recipientId"], w.user_b.as_str());
    assert!(msg["params"]["record"]["message"]
        .as_str()
        .unwrap()
        .contains("쓰레기 버리기"));
}

// ─── Deletion idempotence ────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_a_missing_task_is_not_an_error() {
    let w = linked_world().await;
    let tasks = TaskStorage::new(w.storage.pool());
    tasks.delete("never-existed").await.unwrap();
}
