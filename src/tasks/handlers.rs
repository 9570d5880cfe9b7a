//! Task RPC handlers.

use anyhow::Result;
use serde_json::{json, Value};

use super::lifecycle::LifecycleCoordinator;
use super::model::TaskPatch;
use super::storage::TaskStorage;
use crate::AppContext;

fn task_storage(ctx: &AppContext) -> TaskStorage {
    TaskStorage::new(ctx.storage.pool())
}

fn coordinator(ctx: &AppContext) -> LifecycleCoordinator {
    LifecycleCoordinator::new(ctx.storage.pool(), Some(ctx.broadcaster.clone()))
}

/// `task.create` — create a task for its owning user.
pub async fn create(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params["userId"].as_str().unwrap_or("").to_string();
    let title = params["title"].as_str().unwrap_or("").to_string();
    let description = params["description"].as_str().map(str::to_string);
    let scheduled_time = params["scheduledTime"].as_str().unwrap_or("").to_string();

    let task = task_storage(ctx)
        .create(&user_id, &title, description.as_deref(), &scheduled_time)
        .await?;
    Ok(serde_json::to_value(&task)?)
}

/// `task.get` — fetch a single task by id.
pub async fn get(params: Value, ctx: &AppContext) -> Result<Value> {
    let id = params["id"].as_str().unwrap_or("").to_string();
    let task = task_storage(ctx).get(&id).await?;
    Ok(serde_json::to_value(&task)?)
}

/// `task.list` — all tasks for a user, soonest first.
pub async fn list(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params["userId"].as_str().unwrap_or("").to_string();
    let tasks = task_storage(ctx).list(&user_id).await?;
    Ok(json!({ "tasks": tasks }))
}

/// `task.update` — merge the provided fields into a task.
pub async fn update(params: Value, ctx: &AppContext) -> Result<Value> {
    let id = params["id"].as_str().unwrap_or("").to_string();
    let patch = TaskPatch {
        title: params["title"].as_str().map(str::to_string),
        description: params["description"].as_str().map(str::to_string),
        scheduled_at: params["scheduledTime"].as_str().map(str::to_string),
    };
    let task = task_storage(ctx).update(&id, patch).await?;
    Ok(serde_json::to_value(&task)?)
}

/// `task.complete` — run the completion pipeline on behalf of the owner.
///
/// The result always reflects completion success once the state change
/// lands; `partnerNotified` and `message` only describe the fan-out.
pub async fn complete(params: Value, ctx: &AppContext) -> Result<Value> {
    let id = params["id"].as_str().unwrap_or("").to_string();
    let user_id = params["userId"].as_str().unwrap_or("").to_string();

    let coord = coordinator(ctx);
    let outcome = coord.complete_task(&id, &user_id).await?;

    let message = if outcome.notified.is_some() && coord.partner_notification_enabled(&user_id).await
    {
        "할 일을 완료했어요! 상대방에게 알림을 보냈어요."
    } else {
        "할 일을 완료했어요!"
    };

    Ok(json!({
        "task": outcome.task,
        "partnerNotified": outcome.notified.is_some(),
        "message": message,
    }))
}

/// `task.delete` — hard delete; absent ids succeed.
pub async fn delete(params: Value, ctx: &AppContext) -> Result<Value> {
    let id = params["id"].as_str().unwrap_or("").to_string();
    task_storage(ctx).delete(&id).await?;
    Ok(json!({ "ok": true }))
}
