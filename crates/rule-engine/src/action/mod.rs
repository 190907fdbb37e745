//! 动作执行模块
//!
//! 动作执行采用策略模式：`ActionHandler` 定义统一接口，`HandlerRegistry` 按注册顺序
//! 选出第一个声明支持该动作类型的处理器，`ActionDispatcher` 负责把一切失败转换为结果值。

pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod registry;

pub use dispatcher::ActionDispatcher;
pub use handler::{ActionError, ActionHandler};
pub use handlers::{ComfortNotificationHandler, EmailHandler, LogHandler, WebhookHandler};
pub use registry::HandlerRegistry;
