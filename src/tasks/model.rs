//! Task data model types.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Generate a new ULID string.
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// A scheduled reminder item owned by one user.
///
/// `completed` is monotonic: the only transition this pipeline performs is
/// false → true, and `completed_at` is set exactly once alongside it.
/// `notification_sent` tracks the one-shot *reminder* notification — it is
/// unrelated to the partner-completion fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: i64,
    pub completed: bool,
    pub completed_at: Option<i64>,
    pub notification_sent: bool,
    pub created_at: i64,
}

/// Partial update for `TaskStorage::update`. Absent fields are left as-is.
///
/// `completed` is deliberately not representable here — the completion
/// transition goes through `TaskStorage::complete` only.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    /// RFC 3339 timestamp; parsed and validated before the write.
    pub scheduled_at: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.scheduled_at.is_none()
    }
}

/// Parse an RFC 3339 timestamp into unix epoch seconds.
pub fn parse_timestamp(value: &str) -> Result<i64, PipelineError> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|_| PipelineError::validation(format!("malformed timestamp: {value:?}")))
}
