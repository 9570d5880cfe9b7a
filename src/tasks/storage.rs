//! Task SQLite operations.

use sqlx::SqlitePool;

use super::model::{new_id, parse_timestamp, Task, TaskPatch};
use crate::error::PipelineError;

pub struct TaskStorage {
    pub(crate) pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a task owned by `user_id`. The id and `created_at` are assigned
    /// here; `completed` and `notification_sent` start false.
    pub async fn create(
        &self,
        user_id: &str,
        title: &str,
        description: Option<&str>,
        scheduled_time: &str,
    ) -> Result<Task, PipelineError> {
        if title.trim().is_empty() {
            return Err(PipelineError::validation("title must not be empty"));
        }
        let scheduled_at = parse_timestamp(scheduled_time)?;
        self.ensure_user(user_id).await?;

        let id = new_id();
        sqlx::query(
            "INSERT INTO tasks (id, user_id, title, description, scheduled_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(scheduled_at)
        .execute(&self.pool)
        .await?;
        self.get(&id).await
    }

    pub async fn get(&self, id: &str) -> Result<Task, PipelineError> {
        sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PipelineError::TaskNotFound(id.to_string()))
    }

    /// All tasks owned by `user_id`, soonest first. An empty list is valid;
    /// an unknown user is not.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Task>, PipelineError> {
        self.ensure_user(user_id).await?;
        Ok(sqlx::query_as(
            "SELECT * FROM tasks WHERE user_id = ? ORDER BY scheduled_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Merge the provided fields into an existing task. The completion state
    /// is not reachable through this path — use [`TaskStorage::complete`].
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task, PipelineError> {
        // Surface TaskNotFound before validating the patch contents.
        let current = self.get(id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(PipelineError::validation("title must not be empty"));
            }
        }
        let scheduled_at = match &patch.scheduled_at {
            Some(value) => Some(parse_timestamp(value)?),
            None => None,
        };

        sqlx::query(
            "UPDATE tasks SET \
               title = COALESCE(?, title), \
               description = COALESCE(?, description), \
               scheduled_at = COALESCE(?, scheduled_at) \
             WHERE id = ?",
        )
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(scheduled_at)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get(id).await
    }

    /// Mark a task completed. Idempotent: an already-completed task is
    /// returned unchanged and `completed_at` is never overwritten. Fan-out to
    /// the partner is the lifecycle coordinator's job, not this component's.
    pub async fn complete(&self, id: &str) -> Result<Task, PipelineError> {
        let task = self.get(id).await?;
        if task.completed {
            return Ok(task);
        }

        let now = unixepoch();
        // Guarded write: a concurrent completion loses the race here and the
        // re-read below observes the winner's timestamp.
        sqlx::query(
            "UPDATE tasks SET completed = 1, completed_at = ? \
             WHERE id = ? AND completed = 0",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get(id).await
    }

    /// Hard delete. Removing an absent id is success — deletion is idempotent.
    pub async fn delete(&self, id: &str) -> Result<(), PipelineError> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ─── Reminder sweep support ───────────────────────────────────────────────

    /// Open tasks whose scheduled time has passed and whose one-shot reminder
    /// has not fired yet.
    pub async fn due_for_reminder(&self, now: i64, limit: i64) -> Result<Vec<Task>, PipelineError> {
        Ok(sqlx::query_as(
            "SELECT * FROM tasks \
             WHERE completed = 0 AND notification_sent = 0 AND scheduled_at <= ? \
             ORDER BY scheduled_at ASC LIMIT ?",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Claim the reminder slot for a task. Returns false when the reminder
    /// already fired or the task was completed/deleted in the meantime.
    pub async fn mark_reminder_sent(&self, id: &str) -> Result<bool, PipelineError> {
        let rows_affected = sqlx::query(
            "UPDATE tasks SET notification_sent = 1 \
             WHERE id = ? AND notification_sent = 0 AND completed = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows_affected > 0)
    }

    async fn ensure_user(&self, user_id: &str) -> Result<(), PipelineError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(_) => Ok(()),
            None => Err(PipelineError::UserNotFound(user_id.to_string())),
        }
    }
}

pub(crate) fn unixepoch() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Directory;
    use crate::storage::Storage;

    async fn fixture() -> (TaskStorage, String) {
        let storage = Storage::memory().await.unwrap();
        let user = Directory::new(storage.pool())
            .create_user("test-user")
            .await
            .unwrap();
        (TaskStorage::new(storage.pool()), user.id)
    }

    #[tokio::test]
    async fn create_assigns_id_and_defaults() {
        let (s, uid) = fixture().await;
        let task = s
            .create(&uid, "설거지하기", None, "2026-08-10T18:00:00Z")
            .await
            .unwrap();
        assert!(!task.id.is_empty());
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(!task.notification_sent);
        assert!(task.created_at > 0);
    }

    #[tokio::test]
    async fn create_rejects_empty_title_and_bad_timestamp() {
        let (s, uid) = fixture().await;
        assert!(matches!(
            s.create(&uid, "  ", None, "2026-08-10T18:00:00Z").await,
            Err(PipelineError::Validation(_))
        ));
        assert!(matches!(
            s.create(&uid, "청소", None, "next tuesday").await,
            Err(PipelineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn create_rejects_unknown_owner() {
        let (s, _) = fixture().await;
        assert!(matches!(
            s.create("ghost", "청소", None, "2026-08-10T18:00:00Z").await,
            Err(PipelineError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_orders_by_schedule_and_empty_is_valid() {
        let (s, uid) = fixture().await;
        assert!(s.list(&uid).await.unwrap().is_empty());

        s.create(&uid, "둘째", None, "2026-08-12T09:00:00Z").await.unwrap();
        s.create(&uid, "첫째", None, "2026-08-11T09:00:00Z").await.unwrap();
        s.create(&uid, "셋째", None, "2026-08-13T09:00:00Z").await.unwrap();

        let titles: Vec<String> = s
            .list(&uid)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["첫째", "둘째", "셋째"]);
    }

    #[tokio::test]
    async fn list_unknown_user_fails() {
        let (s, _) = fixture().await;
        assert!(matches!(
            s.list("ghost").await,
            Err(PipelineError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_merges_only_provided_fields() {
        let (s, uid) = fixture().await;
        let task = s
            .create(&uid, "빨래", Some("세탁기 돌리기"), "2026-08-10T18:00:00Z")
            .await
            .unwrap();

        let updated = s
            .update(
                &task.id,
                TaskPatch {
                    title: Some("빨래 널기".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "빨래 널기");
        assert_eq!(updated.description.as_deref(), Some("세탁기 돌리기"));
        assert_eq!(updated.scheduled_at, task.scheduled_at);
    }

    #[tokio::test]
    async fn update_unknown_id_fails() {
        let (s, _) = fixture().await;
        assert!(matches!(
            s.update("missing", TaskPatch::default()).await,
            Err(PipelineError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn complete_is_idempotent() {
        let (s, uid) = fixture().await;
        let task = s
            .create(&uid, "장보기", None, "2026-08-10T18:00:00Z")
            .await
            .unwrap();

        let first = s.complete(&task.id).await.unwrap();
        assert!(first.completed);
        let completed_at = first.completed_at.unwrap();

        let second = s.complete(&task.id).await.unwrap();
        assert!(second.completed);
        assert_eq!(second.completed_at, Some(completed_at));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (s, uid) = fixture().await;
        let task = s
            .create(&uid, "장보기", None, "2026-08-10T18:00:00Z")
            .await
            .unwrap();
        s.delete(&task.id).await.unwrap();
        assert!(matches!(
            s.get(&task.id).await,
            Err(PipelineError::TaskNotFound(_))
        ));
        // Second delete of the same id is still success.
        s.delete(&task.id).await.unwrap();
    }

    #[tokio::test]
    async fn reminder_slot_claims_once() {
        let (s, uid) = fixture().await;
        let task = s
            .create(&uid, "약 먹기", None, "2020-01-01T09:00:00Z")
            .await
            .unwrap();

        let due = s.due_for_reminder(unixepoch(), 10).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, task.id);

        assert!(s.mark_reminder_sent(&task.id).await.unwrap());
        assert!(!s.mark_reminder_sent(&task.id).await.unwrap());
        assert!(s.due_for_reminder(unixepoch(), 10).await.unwrap().is_empty());
    }
}
