use serde_json::Value;
use tokio::sync::broadcast;

use crate::notify::model::NotificationRecord;

/// Broadcasts JSON-RPC notification strings to all connected WebSocket
/// clients. This is the live, in-session delivery channel — advisory only;
/// the persisted NotificationRecord is the durable source of truth.
#[derive(Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<String>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    /// Send a JSON-RPC notification to all connected clients.
    pub fn broadcast(&self, method: &str, params: Value) {
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        // Ignore errors — no subscribers is fine
        let _ = self
            .tx
            .send(serde_json::to_string(&notification).unwrap_or_default());
    }

    /// Push a delivery record to connected clients as `notification.push`.
    /// Clients filter on `recipientId`.
    pub fn push_record(&self, record: &NotificationRecord) {
        self.broadcast(
            "notification.push",
            serde_json::json!({
                "recipientId": record.recipient_id,
                "record": record,
            }),
        );
    }

    /// True when at least one client is connected. Used to decide whether a
    /// live push is even worth attempting.
    pub fn is_reachable(&self) -> bool {
        self.tx.receiver_count() > 0
    }

    /// Subscribe to all broadcast events.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}
