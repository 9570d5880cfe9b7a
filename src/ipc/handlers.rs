//! Daemon-level RPC handlers.

use anyhow::Result;
use serde_json::{json, Value};

use crate::AppContext;

/// `daemon.ping` — liveness check.
pub async fn ping(_params: Value, _ctx: &AppContext) -> Result<Value> {
    Ok(json!({ "pong": true, "version": env!("CARGO_PKG_VERSION") }))
}

/// `daemon.status` — uptime and database health.
pub async fn status(_params: Value, ctx: &AppContext) -> Result<Value> {
    let status = crate::observability::HealthStatus::ok(
        ctx.started_at.elapsed().as_secs(),
        ctx.storage.ping().await,
    );
    Ok(serde_json::to_value(&status)?)
}
