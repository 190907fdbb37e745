//! 动作分发器
//!
//! 为处理器调用建立失败边界：找不到处理器、处理器返回错误、处理器 panic 或超时，
//! 都转换为 `success=false` 的 `ActionResult`，调用方永远只看到结果值。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use ruleflow_shared::observability::metrics;
use tracing::{debug, warn};

use crate::action::handler::ActionError;
use crate::action::registry::HandlerRegistry;
use crate::models::{Action, ActionResult, FactSet};

/// 动作分发器
#[derive(Clone)]
pub struct ActionDispatcher {
    registry: Arc<HandlerRegistry>,
    handler_timeout: Option<Duration>,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            handler_timeout: None,
        }
    }

    /// 设置单个处理器的执行超时，None 表示不限时
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// 执行单个动作
    pub async fn dispatch(&self, action: &Action, context: &FactSet) -> ActionResult {
        let start = Instant::now();

        let result = match self.try_dispatch(action, context).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    action_id = action.id,
                    action_type = %action.action_type,
                    error = %e,
                    "动作执行失败"
                );
                ActionResult::failure(action, e.to_string())
            }
        };

        metrics::record_action_dispatch(
            &action.action_type,
            result.success,
            start.elapsed().as_secs_f64(),
        );
        result
    }

    /// 按顺序执行多个动作，前一个动作的失败不影响后续动作
    pub async fn dispatch_all(&self, actions: &[Action], context: &FactSet) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(actions.len());
        for action in actions {
            results.push(self.dispatch(action, context).await);
        }
        results
    }

    async fn try_dispatch(
        &self,
        action: &Action,
        context: &FactSet,
    ) -> Result<ActionResult, ActionError> {
        let handler = self
            .registry
            .find(&action.action_type)
            .ok_or_else(|| ActionError::UnsupportedType(action.action_type.clone()))?;

        debug!(
            action_id = action.id,
            handler = handler.name(),
            "分发动作"
        );

        let guarded = AssertUnwindSafe(handler.handle(action, context)).catch_unwind();
        let outcome = match self.handler_timeout {
            Some(limit) => tokio::time::timeout(limit, guarded)
                .await
                .map_err(|_| ActionError::Timeout(limit))?,
            None => guarded.await,
        };

        outcome.map_err(|payload| ActionError::Panicked(panic_message(payload.as_ref())))?
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
