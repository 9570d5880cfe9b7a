// notify/reminder.rs — Reminder sweep background task.
//
// Runs on a fixed interval. Fires the one-shot reminder notification for
// tasks whose scheduled time has passed, then marks them so a reminder
// never fires twice.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use super::dispatcher::Dispatcher;
use crate::ipc::event::EventBroadcaster;
use crate::storage::Storage;
use crate::tasks::storage::{unixepoch, TaskStorage};

/// Upper bound on tasks handled per sweep; the remainder is picked up on the
/// next tick.
const SWEEP_BATCH: i64 = 100;

/// Dispatch reminders for all currently-due tasks. Returns how many fired.
pub async fn sweep_due_reminders(storage: &Storage, dispatcher: &Dispatcher) -> Result<usize> {
    let tasks = TaskStorage::new(storage.pool());
    let due = tasks.due_for_reminder(unixepoch(), SWEEP_BATCH).await?;

    let mut fired = 0;
    for task in due {
        // Claim the slot first — at most one reminder per task even when two
        // daemon instances share the database.
        if !tasks.mark_reminder_sent(&task.id).await? {
            continue;
        }
        match dispatcher.dispatch_reminder(&task).await {
            Ok(_) => fired += 1,
            Err(e) => {
                warn!(task_id = %task.id, err = %e, "reminder dispatch failed");
            }
        }
    }
    Ok(fired)
}

/// Background sweep loop — call this in a `tokio::spawn` during startup.
pub async fn run_reminder_sweep(
    storage: Arc<Storage>,
    live: Arc<EventBroadcaster>,
    poll_interval_secs: u64,
) {
    info!(interval_secs = poll_interval_secs, "reminder sweep started");
    let dispatcher = Dispatcher::new(storage.pool(), Some(live));
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(poll_interval_secs));

    loop {
        interval.tick().await;
        match sweep_due_reminders(&storage, &dispatcher).await {
            Ok(n) if n > 0 => info!(fired = n, "reminder sweep dispatched due reminders"),
            Ok(_) => {}
            Err(e) => warn!(err = %e, "reminder sweep error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Directory;
    use crate::notify::storage::NotificationStorage;

    #[tokio::test]
    async fn sweep_fires_once_per_due_task() {
        let storage = Storage::memory().await.unwrap();
        let dir = Directory::new(storage.pool());
        let user = dir.create_user("a").await.unwrap();
        let tasks = TaskStorage::new(storage.pool());

        let due = tasks
            .create(&user.id, "약 먹기", None, "2020-01-01T09:00:00Z")
            .await
            .unwrap();
        // Far in the future — must not fire.
        tasks
            .create(&user.id, "미래 일정", None, "2099-01-01T09:00:00Z")
            .await
            .unwrap();

        let dispatcher = Dispatcher::new(storage.pool(), None);
        assert_eq!(sweep_due_reminders(&storage, &dispatcher).await.unwrap(), 1);
        // Idempotent across ticks.
        assert_eq!(sweep_due_reminders(&storage, &dispatcher).await.unwrap(), 0);

        let records = NotificationStorage::new(storage.pool())
            .list_for_task(&due.id)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, "reminder");
        assert_eq!(records[0].recipient_id, user.id);
        assert!(records[0].message.contains("약 먹기"));
    }

    #[tokio::test]
    async fn completed_tasks_get_no_reminder() {
        let storage = Storage::memory().await.unwrap();
        let dir = Directory::new(storage.pool());
        let user = dir.create_user("a").await.unwrap();
        let tasks = TaskStorage::new(storage.pool());

        let task = tasks
            .create(&user.id, "이미 끝남", None, "2020-01-01T09:00:00Z")
            .await
            .unwrap();
        tasks.complete(&task.id).await.unwrap();

        let dispatcher = Dispatcher::new(storage.pool(), None);
        assert_eq!(sweep_due_reminders(&storage, &dispatcher).await.unwrap(), 0);
    }
}
