//! 日志动作处理器

use async_trait::async_trait;
use tracing::info;

use crate::action::handler::{ActionError, ActionHandler};
use crate::models::{Action, ActionResult, FactSet};

pub const LOG_CONFIRMATION: &str = "日志已记录";

pub struct LogHandler;

#[async_trait]
impl ActionHandler for LogHandler {
    fn supports(&self, action_type: &str) -> bool {
        action_type.eq_ignore_ascii_case("LOG")
    }

    fn name(&self) -> &'static str {
        "log"
    }

    async fn handle(
        &self,
        action: &Action,
        context: &FactSet,
    ) -> Result<ActionResult, ActionError> {
        info!(
            action_id = action.id,
            rule_id = ?context.get("ruleId"),
            parameters = %action.parameters,
            "规则动作日志"
        );
        Ok(ActionResult::success(action, LOG_CONFIRMATION))
    }
}
