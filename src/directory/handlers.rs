//! User and partner-link RPC handlers. Thin CRUD — the pipeline itself only
//! reads the link.

use anyhow::Result;
use serde_json::{json, Value};

use super::Directory;
use crate::AppContext;

fn directory(ctx: &AppContext) -> Directory {
    Directory::new(ctx.storage.pool())
}

/// `user.register` — create a user record.
pub async fn register(params: Value, ctx: &AppContext) -> Result<Value> {
    let name = params["name"].as_str().unwrap_or("").to_string();
    let user = directory(ctx).create_user(&name).await?;
    Ok(serde_json::to_value(&user)?)
}

/// `user.get` — fetch a user by id.
pub async fn get(params: Value, ctx: &AppContext) -> Result<Value> {
    let id = params["id"].as_str().unwrap_or("").to_string();
    let user = directory(ctx).get_user(&id).await?;
    Ok(serde_json::to_value(&user)?)
}

/// `user.link` — link two users symmetrically.
pub async fn link(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params["userId"].as_str().unwrap_or("").to_string();
    let partner_id = params["partnerId"].as_str().unwrap_or("").to_string();
    directory(ctx).link_partners(&user_id, &partner_id).await?;
    Ok(json!({ "ok": true }))
}

/// `user.unlink` — clear the link on both sides.
pub async fn unlink(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params["userId"].as_str().unwrap_or("").to_string();
    directory(ctx).unlink_partners(&user_id).await?;
    Ok(json!({ "ok": true }))
}

/// `partner.get` — resolve the linked partner id. A missing link yields
/// `partnerId: null`, not an error.
pub async fn partner(params: Value, ctx: &AppContext) -> Result<Value> {
    let user_id = params["userId"].as_str().unwrap_or("").to_string();
    let partner_id = directory(ctx).get_partner_id(&user_id).await?;
    Ok(json!({ "partnerId": partner_id }))
}
