//! Handler 注册表
//!
//! 按注册顺序保存所有 ActionHandler，查找时线性扫描，返回第一个声明支持该动作类型的处理器。

use std::sync::Arc;

use tracing::{debug, info};

use crate::action::handler::ActionHandler;
use crate::action::handlers::{
    ComfortNotificationHandler, EmailHandler, LogHandler, WebhookHandler,
};
use crate::notification::{LogNotifier, Notifier};

/// Handler 注册表
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// 注册一个 Handler
    ///
    /// 先注册的处理器优先匹配。
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) -> &mut Self {
        debug!(handler = handler.name(), "注册动作处理器");
        self.handlers.push(handler);
        self
    }

    /// 查找第一个支持该动作类型的 Handler
    pub fn find(&self, action_type: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers
            .iter()
            .find(|h| h.supports(action_type))
            .cloned()
    }

    /// 检查是否存在支持该动作类型的 Handler
    pub fn supports(&self, action_type: &str) -> bool {
        self.handlers.iter().any(|h| h.supports(action_type))
    }

    /// 获取所有已注册 Handler 的名称（按注册顺序）
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// 创建包含内置 Handler 的注册表
    ///
    /// 默认注册以下 Handler:
    /// - EmailHandler: 邮件发送，委托给通知协作者
    /// - WebhookHandler: Webhook 回调
    /// - ComfortNotificationHandler: 舒适度通知
    /// - LogHandler: 日志记录
    pub fn with_defaults(notifier: Arc<dyn Notifier>) -> Self {
        let mut registry = Self::new();

        registry
            .register(Arc::new(EmailHandler::new(notifier)))
            .register(Arc::new(WebhookHandler))
            .register(Arc::new(ComfortNotificationHandler))
            .register(Arc::new(LogHandler));

        info!(
            handler_count = registry.len(),
            handlers = ?registry.handler_names(),
            "默认动作处理器初始化完成"
        );

        registry
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults(Arc::new(LogNotifier::default()))
    }
}
