//! 邮件动作处理器
//!
//! 动作参数为 JSON 文本 `{"to": ..., "subject": ..., "body": ...}`，
//! 解析成功后交给通知协作者发送。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::action::handler::{ActionError, ActionHandler};
use crate::models::{Action, ActionResult, FactSet};
use crate::notification::{EmailMessage, Notifier};

/// 邮件参数，字段缺失时为 None 以便给出明确的错误信息
#[derive(Debug, Deserialize)]
struct EmailPayload {
    to: Option<String>,
    subject: Option<String>,
    body: Option<String>,
}

/// 邮件处理器
pub struct EmailHandler {
    notifier: Arc<dyn Notifier>,
}

impl EmailHandler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    fn parse_payload(parameters: &str) -> Result<EmailMessage, ActionError> {
        let payload: EmailPayload = serde_json::from_str(parameters)
            .map_err(|e| ActionError::InvalidPayload(format!("邮件参数解析失败: {}", e)))?;

        let required = |value: Option<String>, field: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ActionError::InvalidPayload(format!("邮件参数缺少字段 {}", field)))
        };

        Ok(EmailMessage {
            to: required(payload.to, "to")?,
            subject: required(payload.subject, "subject")?,
            body: required(payload.body, "body")?,
        })
    }
}

#[async_trait]
impl ActionHandler for EmailHandler {
    fn supports(&self, action_type: &str) -> bool {
        action_type.eq_ignore_ascii_case("EMAIL")
    }

    fn name(&self) -> &'static str {
        "email"
    }

    #[instrument(skip(self, action, _context), fields(action_id = action.id))]
    async fn handle(
        &self,
        action: &Action,
        _context: &FactSet,
    ) -> Result<ActionResult, ActionError> {
        let message = Self::parse_payload(&action.parameters)?;

        self.notifier.send_email(&message).await?;

        info!(to = %message.to, "邮件动作执行完成");
        Ok(ActionResult::success(
            action,
            format!("邮件已发送至 {}", message.to),
        ))
    }
}
