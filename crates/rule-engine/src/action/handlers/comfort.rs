//! 舒适度通知处理器
//!
//! 从增强后的上下文（而不是动作参数）读取位置与舒适度信息，打包为通知输出。

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::action::handler::{ActionError, ActionHandler};
use crate::models::{Action, ActionResult, FactSet};

pub struct ComfortNotificationHandler;

impl ComfortNotificationHandler {
    fn field(context: &FactSet, name: &str) -> Value {
        context.get(name).cloned().unwrap_or(Value::Null)
    }
}

#[async_trait]
impl ActionHandler for ComfortNotificationHandler {
    fn supports(&self, action_type: &str) -> bool {
        action_type.eq_ignore_ascii_case("COMFORT_NOTIFICATION")
    }

    fn name(&self) -> &'static str {
        "comfort_notification"
    }

    async fn handle(
        &self,
        action: &Action,
        context: &FactSet,
    ) -> Result<ActionResult, ActionError> {
        let notification = json!({
            "location": Self::field(context, "location"),
            "comfortIndex": Self::field(context, "comfortIndex"),
            "comfortGrade": Self::field(context, "comfortGrade"),
            "notifiedAt": Utc::now().to_rfc3339(),
        });

        info!(
            action_id = action.id,
            location = %notification["location"],
            grade = %notification["comfortGrade"],
            "舒适度通知已生成"
        );

        Ok(ActionResult::success(action, "舒适度通知已生成").with_output(notification))
    }
}
