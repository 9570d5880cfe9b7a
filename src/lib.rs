pub mod config;
pub mod directory;
pub mod error;
pub mod ipc;
pub mod notify;
pub mod observability;
pub mod storage;
pub mod tasks;

use std::sync::Arc;

use config::DaemonConfig;
use ipc::event::EventBroadcaster;
use storage::Storage;

/// Shared application state passed to every RPC handler and background task.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    pub storage: Arc<Storage>,
    /// Live notification channel shared by all connected clients.
    pub broadcaster: Arc<EventBroadcaster>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: DaemonConfig, storage: Storage) -> Self {
        Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            broadcaster: Arc::new(EventBroadcaster::new()),
            started_at: std::time::Instant::now(),
        }
    }
}
