//! 动作处理器 Trait 定义
//!
//! 提供动作执行的统一抽象接口，支持不同动作类型的多态实现

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Action, ActionResult, FactSet};
use crate::notification::NotifyError;

/// 动作执行错误
///
/// 只在处理器与分发器之间传递，分发器会将其转换为失败的 `ActionResult`。
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("不支持的动作类型: {0}")]
    UnsupportedType(String),

    #[error("动作参数无效: {0}")]
    InvalidPayload(String),

    #[error("通知投递失败: {0}")]
    Delivery(#[from] NotifyError),

    #[error("动作执行超时: {0:?}")]
    Timeout(Duration),

    #[error("动作处理器异常终止: {0}")]
    Panicked(String),
}

/// 动作处理器 Trait
///
/// 每种动作类型（邮件、Webhook、舒适度通知、日志...）实现此 trait，
/// 通过注册表按 `supports` 能力声明进行匹配。新增动作类型只需注册新的处理器。
///
/// # 示例
///
/// ```ignore
/// struct SmsHandler;
///
/// #[async_trait]
/// impl ActionHandler for SmsHandler {
///     fn supports(&self, action_type: &str) -> bool {
///         action_type.eq_ignore_ascii_case("SMS")
///     }
///
///     fn name(&self) -> &'static str {
///         "sms"
///     }
///
///     async fn handle(&self, action: &Action, context: &FactSet) -> Result<ActionResult, ActionError> {
///         Ok(ActionResult::success(action, "短信已发送"))
///     }
/// }
/// ```
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// 是否能处理指定的动作类型
    fn supports(&self, action_type: &str) -> bool;

    /// 处理器名称（用于日志）
    fn name(&self) -> &'static str;

    /// 执行动作
    ///
    /// `context` 是经过增强的事实集（包含 ruleId、ruleName、evaluatedAt），
    /// 而不是调用方提供的原始事实。
    async fn handle(&self, action: &Action, context: &FactSet)
    -> Result<ActionResult, ActionError>;
}
