//! 通知协作者
//!
//! 核心只依赖单一的邮件发送操作，实际投递渠道（SMTP、第三方邮件服务）在外部实现。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// 邮件消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("收件人地址无效: {0}")]
    InvalidRecipient(String),

    #[error("邮件投递失败: {0}")]
    Delivery(String),
}

/// 通知发送接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// 仅记录日志的通知实现
#[derive(Debug, Clone)]
pub struct LogNotifier {
    from_address: String,
}

impl LogNotifier {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new("noreply@ruleflow.local")
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        if !message.to.contains('@') {
            return Err(NotifyError::InvalidRecipient(message.to.clone()));
        }

        info!(
            from = %self.from_address,
            to = %message.to,
            subject = %message.subject,
            body_len = message.body.len(),
            "邮件已提交"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Comfort alert".to_string(),
            body: "It is 31 degrees in Seoul".to_string(),
        }
    }

    #[tokio::test]
    async fn test_log_notifier_accepts_address() {
        let notifier = LogNotifier::default();
        assert!(notifier.send_email(&message("ops@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_rejects_invalid_recipient() {
        let notifier = LogNotifier::new("alerts@example.com");
        let err = notifier.send_email(&message("nobody")).await.unwrap_err();
        assert!(matches!(err, NotifyError::InvalidRecipient(_)));
    }
}
