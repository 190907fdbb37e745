//! 内置动作处理器

mod comfort;
mod email;
mod log;
mod webhook;

pub use comfort::ComfortNotificationHandler;
pub use email::EmailHandler;
pub use log::{LOG_CONFIRMATION, LogHandler};
pub use webhook::{WEBHOOK_CONFIRMATION, WebhookHandler};
