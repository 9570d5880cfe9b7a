//! Notification history and preference RPC handlers.

use anyhow::Result;
use serde_json::{json, Value};

use super::storage::NotificationStorage;
use crate::AppContext;

/// `notification.list` — newest-first delivery history for a recipient.
pub async fn list(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params["userId"].as_str().unwrap_or("").to_string();
    let limit = params["limit"].as_i64().unwrap_or(50);
    let records = NotificationStorage::new(ctx.storage.pool())
        .list_for_recipient(&user_id, limit)
        .await?;
    Ok(json!({ "notifications": records }))
}

/// `preference.get` — read a per-user preference value.
pub async fn preference_get(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params["userId"].as_str().unwrap_or("").to_string();
    let key = params["key"].as_str().unwrap_or("").to_string();
    let value = ctx.storage.get_preference(&user_id, &key).await?;
    Ok(json!({ "key": key, "value": value }))
}

/// `preference.set` — write a per-user preference value.
pub async fn preference_set(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params["userId"].as_str().unwrap_or("").to_string();
    let key = params["key"].as_str().unwrap_or("").to_string();
    let value = params["value"].as_str().unwrap_or("").to_string();
    ctx.storage.set_preference(&user_id, &key, &value).await?;
    Ok(json!({ "ok": true }))
}
