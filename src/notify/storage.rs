//! Notification SQLite operations (insert-only append + reads).

use sqlx::SqlitePool;

use super::model::{NotificationKind, NotificationRecord};
use crate::error::PipelineError;
use crate::tasks::model::new_id;

pub struct NotificationStorage {
    pub(crate) pool: SqlitePool,
}

impl NotificationStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one delivery record. There is no update or delete path.
    pub async fn append(
        &self,
        recipient_id: &str,
        task_id: &str,
        kind: NotificationKind,
        message: &str,
    ) -> Result<NotificationRecord, PipelineError> {
        let id = new_id();
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, task_id, kind, message) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(recipient_id)
        .bind(task_id)
        .bind(kind.as_str())
        .bind(message)
        .execute(&self.pool)
        .await?;

        Ok(sqlx::query_as("SELECT * FROM notifications WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await?)
    }

    /// Newest-first history for a recipient (notification tray).
    pub async fn list_for_recipient(
        &self,
        recipient_id: &str,
        limit: i64,
    ) -> Result<Vec<NotificationRecord>, PipelineError> {
        Ok(sqlx::query_as(
            "SELECT * FROM notifications WHERE recipient_id = ? \
             ORDER BY sent_at DESC, id DESC LIMIT ?",
        )
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn list_for_task(&self, task_id: &str) -> Result<Vec<NotificationRecord>, PipelineError> {
        Ok(
            sqlx::query_as("SELECT * FROM notifications WHERE task_id = ? ORDER BY sent_at ASC")
                .bind(task_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
