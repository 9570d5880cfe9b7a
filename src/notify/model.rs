//! Notification data model types.

use serde::{Deserialize, Serialize};

/// Delivery record kind. Stored as lowercase text in the `notifications`
/// table (`reminder` | `completion`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// One-shot "scheduled time arrived" notification to the task owner.
    Reminder,
    /// Partner fan-out after a task completes.
    Completion,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Reminder => "reminder",
            NotificationKind::Completion => "completion",
        }
    }
}

/// Durable, append-only log entry for one dispatch attempt. Never mutated
/// and never retried after insert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub recipient_id: String,
    pub task_id: String,
    pub kind: String,
    pub message: String,
    pub sent_at: i64,
}

/// Completion message shown to the partner. The task title appears verbatim.
pub fn completion_message(title: &str) -> String {
    format!("상대방이 \"{title}\"을(를) 완료했습니다!")
}

/// Reminder message shown to the task owner at the scheduled time.
pub fn reminder_message(title: &str) -> String {
    format!("\"{title}\" 할 일을 완료할 시간이에요!")
}
