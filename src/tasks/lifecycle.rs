//! Task lifecycle coordination — "complete → resolve partner → dispatch →
//! report" as one logical operation with partial-failure tolerance.
//!
//! The durable state change (step 3) is authoritative: store errors up to and
//! including it propagate untouched. Everything after it is best-effort —
//! once the task is durably completed, the caller always sees success.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::warn;

use super::model::Task;
use super::storage::TaskStorage;
use crate::directory::Directory;
use crate::error::PipelineError;
use crate::ipc::event::EventBroadcaster;
use crate::notify::dispatcher::Dispatcher;

/// Outcome of a completion run.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    /// The authoritative updated entity. Callers refresh their own views
    /// from this — there is no implicit shared-cache mutation.
    pub task: Task,
    /// Partner id when a completion record was persisted for them.
    pub notified: Option<String>,
    /// False when the task was already completed and the call was a no-op.
    pub transitioned: bool,
}

pub struct LifecycleCoordinator {
    tasks: TaskStorage,
    directory: Directory,
    dispatcher: Dispatcher,
}

impl LifecycleCoordinator {
    pub fn new(pool: SqlitePool, live: Option<Arc<EventBroadcaster>>) -> Self {
        Self {
            tasks: TaskStorage::new(pool.clone()),
            directory: Directory::new(pool.clone()),
            dispatcher: Dispatcher::new(pool, live),
        }
    }

    /// Explicit wiring for tests that need a collaborator to misbehave.
    pub fn with_parts(tasks: TaskStorage, directory: Directory, dispatcher: Dispatcher) -> Self {
        Self {
            tasks,
            directory,
            dispatcher,
        }
    }

    /// Complete a task on behalf of `acting_user_id` and fan the result out
    /// to the linked partner.
    ///
    /// Calling this twice for the same task is always safe: the second call
    /// observes `completed = true`, short-circuits, and creates no record.
    pub async fn complete_task(
        &self,
        task_id: &str,
        acting_user_id: &str,
    ) -> Result<CompletionOutcome, PipelineError> {
        let task = self.tasks.get(task_id).await?;
        if task.user_id != acting_user_id {
            return Err(PipelineError::Forbidden {
                user_id: acting_user_id.to_string(),
                task_id: task_id.to_string(),
            });
        }
        if task.completed {
            return Ok(CompletionOutcome {
                task,
                notified: None,
                transitioned: false,
            });
        }

        // Authoritative state change. Failures here (e.g. concurrent delete)
        // propagate untouched — no partial state is left behind.
        let task = self.tasks.complete(task_id).await?;

        let partner = match self.directory.get_partner_id(acting_user_id).await {
            Ok(partner) => partner,
            Err(e) => {
                // The task is already durably completed — a directory fault
                // degrades to the no-partner path.
                warn!(task_id = %task.id, err = %e, "partner lookup failed after completion");
                None
            }
        };
        let Some(partner_id) = partner else {
            return Ok(CompletionOutcome {
                task,
                notified: None,
                transitioned: true,
            });
        };

        let notified = match self.dispatcher.dispatch_completion(&task, &partner_id).await {
            Ok(record) => record.map(|r| r.recipient_id),
            Err(e) => {
                warn!(task_id = %task.id, recipient = %partner_id, err = %e,
                      "completion notification dispatch failed");
                None
            }
        };

        Ok(CompletionOutcome {
            task,
            notified,
            transitioned: true,
        })
    }

    /// Caller-facing wording check. Delegates to the dispatcher's preference
    /// read; never affects what was persisted.
    pub async fn partner_notification_enabled(&self, user_id: &str) -> bool {
        self.dispatcher.is_partner_notification_enabled(user_id).await
    }
}
