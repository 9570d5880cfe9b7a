//! Notification dispatcher — turns pipeline events into durable delivery
//! records plus a best-effort live push.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::debug;

use super::model::{completion_message, reminder_message, NotificationKind, NotificationRecord};
use super::storage::NotificationStorage;
use crate::error::PipelineError;
use crate::ipc::event::EventBroadcaster;
use crate::tasks::model::Task;

/// Preference key read by [`Dispatcher::is_partner_notification_enabled`].
pub const PARTNER_NOTIFICATION_ENABLED: &str = "partner_notification_enabled";

pub struct Dispatcher {
    store: NotificationStorage,
    /// Live in-session channel. `None` when no channel is wired up — records
    /// are persisted either way.
    live: Option<Arc<EventBroadcaster>>,
}

impl Dispatcher {
    pub fn new(pool: SqlitePool, live: Option<Arc<EventBroadcaster>>) -> Self {
        Self {
            store: NotificationStorage::new(pool),
            live,
        }
    }

    /// Fan a completed task out to the partner.
    ///
    /// An empty recipient is a no-op success (task owner without a linked
    /// partner) — zero records are created. Otherwise one `completion` record
    /// is persisted and a live push is attempted if a channel is reachable.
    pub async fn dispatch_completion(
        &self,
        task: &Task,
        recipient_id: &str,
    ) -> Result<Option<NotificationRecord>, PipelineError> {
        if recipient_id.is_empty() {
            return Ok(None);
        }

        let message = completion_message(&task.title);
        let record = self
            .store
            .append(recipient_id, &task.id, NotificationKind::Completion, &message)
            .await
            .map_err(|e| PipelineError::Dispatch(e.to_string()))?;

        self.push_live(&record);
        Ok(Some(record))
    }

    /// Fire the one-shot scheduled-time reminder to the task owner.
    pub async fn dispatch_reminder(&self, task: &Task) -> Result<NotificationRecord, PipelineError> {
        let message = reminder_message(&task.title);
        let record = self
            .store
            .append(&task.user_id, &task.id, NotificationKind::Reminder, &message)
            .await
            .map_err(|e| PipelineError::Dispatch(e.to_string()))?;

        self.push_live(&record);
        Ok(record)
    }

    /// Per-user flag deciding the caller-facing success wording only — it
    /// never suppresses record persistence. Defaults to enabled; a failed
    /// read counts as enabled.
    pub async fn is_partner_notification_enabled(&self, user_id: &str) -> bool {
        let row: Result<Option<(String,)>, _> =
            sqlx::query_as("SELECT value FROM preferences WHERE user_id = ? AND key = ?")
                .bind(user_id)
                .bind(PARTNER_NOTIFICATION_ENABLED)
                .fetch_optional(&self.store.pool)
                .await;
        match row {
            Ok(Some((value,))) => value != "false",
            _ => true,
        }
    }

    fn push_live(&self, record: &NotificationRecord) {
        let Some(live) = &self.live else {
            return;
        };
        if !live.is_reachable() {
            debug!(recipient = %record.recipient_id, "no live channel subscriber — record persisted only");
            return;
        }
        live.push_record(record);
    }
}
