pub mod dispatcher;
pub mod handlers;
pub mod model;
pub mod reminder;
pub mod storage;

pub use dispatcher::Dispatcher;
pub use model::{NotificationKind, NotificationRecord};
pub use storage::NotificationStorage;
