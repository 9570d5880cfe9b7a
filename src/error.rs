//! Error taxonomy for the task lifecycle pipeline.
//!
//! State-store errors always propagate to the caller; notification-path
//! errors (`Dispatch`) never escape the lifecycle coordinator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed input — nothing was created or modified.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Acting user does not own the task. No mutation occurred.
    #[error("user {user_id} does not own task {task_id}")]
    Forbidden { user_id: String, task_id: String },

    /// Notification fan-out failed. Internal only — logged and swallowed by
    /// the lifecycle coordinator.
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
