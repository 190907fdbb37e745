//! Webhook 动作处理器
//!
//! 投递由外部完成，这里只确认动作已受理。

use async_trait::async_trait;
use tracing::debug;

use crate::action::handler::{ActionError, ActionHandler};
use crate::models::{Action, ActionResult, FactSet};

pub const WEBHOOK_CONFIRMATION: &str = "Webhook 已触发";

pub struct WebhookHandler;

#[async_trait]
impl ActionHandler for WebhookHandler {
    fn supports(&self, action_type: &str) -> bool {
        action_type.eq_ignore_ascii_case("WEBHOOK")
    }

    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn handle(
        &self,
        action: &Action,
        _context: &FactSet,
    ) -> Result<ActionResult, ActionError> {
        debug!(action_id = action.id, parameters = %action.parameters, "Webhook 动作");
        Ok(ActionResult::success(action, WEBHOOK_CONFIRMATION))
    }
}
