//! 规则编排器
//!
//! 负责从触发事件选出候选规则、校验输入、评估规则的全部条件，
//! 并在条件全部满足时按顺序分发规则的动作。
//!
//! 两个入口共享同一套单规则评估逻辑：
//! - 触发入口：按事件类型与事件参数选择规则，只评估启用的规则，单条规则的失败被隔离
//! - 手动入口：直接评估指定规则，不检查启用状态，错误直接返回给调用方

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use ruleflow_shared::observability::metrics;
use tracing::{debug, info, instrument, warn};

use crate::action::ActionDispatcher;
use crate::compiler::RuleSnapshot;
use crate::error::{Result, RuleError};
use crate::evaluator::ConditionEvaluator;
use crate::models::{
    FactSet, MESSAGE_MATCHED, MESSAGE_NOT_MATCHED, Rule, RuleEvaluationResult,
};
use crate::repository::RuleRepository;

/// 上下文增强字段
pub const CONTEXT_RULE_ID: &str = "ruleId";
pub const CONTEXT_RULE_NAME: &str = "ruleName";
pub const CONTEXT_EVALUATED_AT: &str = "evaluatedAt";

/// 规则编排器
#[derive(Clone)]
pub struct RuleOrchestrator {
    repository: Arc<dyn RuleRepository>,
    dispatcher: ActionDispatcher,
}

impl RuleOrchestrator {
    pub fn new(repository: Arc<dyn RuleRepository>, dispatcher: ActionDispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    pub fn repository(&self) -> &Arc<dyn RuleRepository> {
        &self.repository
    }

    /// 触发入口：评估所有绑定到该事件的启用规则
    ///
    /// 结果按绑定 ID 顺序排列，同一规则被多个绑定命中时只评估一次。
    #[instrument(skip(self, facts), fields(fact_count = facts.len()))]
    pub async fn evaluate_triggered(
        &self,
        event_type: &str,
        event_params: &str,
        facts: &FactSet,
    ) -> Result<Vec<RuleEvaluationResult>> {
        let candidates = self.select_candidates(event_type, event_params).await?;
        debug!(candidates = candidates.len(), "候选规则选择完成");

        let mut results = Vec::with_capacity(candidates.len());
        for rule_id in candidates {
            // 单条规则的失败只影响该规则，不中断同批其他规则
            let snapshot = match self.repository.load_snapshot(rule_id).await {
                Ok(snapshot) => snapshot,
                Err(RuleError::NotFound { .. }) => {
                    // 绑定读取之后规则被删除
                    warn!(rule_id, "触发绑定指向的规则不存在，跳过");
                    continue;
                }
                Err(e) => {
                    warn!(rule_id, error = %e, "规则快照加载失败，跳过");
                    continue;
                }
            };

            match self.is_enabled(&snapshot.rule).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(rule_id, "规则或规则组未启用，跳过");
                    continue;
                }
                Err(e) => {
                    warn!(rule_id, error = %e, "规则组状态查询失败");
                    results.push(RuleEvaluationResult::rejected(&snapshot.rule, e.to_string()));
                    continue;
                }
            }

            match self.evaluate_snapshot(&snapshot, facts).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(rule_id, error = %e, "规则评估失败");
                    results.push(RuleEvaluationResult::rejected(&snapshot.rule, e.to_string()));
                }
            }
        }

        info!(
            event_type,
            evaluated = results.len(),
            matched = results.iter().filter(|r| r.success).count(),
            "触发评估完成"
        );
        Ok(results)
    }

    /// 手动入口：直接评估指定规则
    #[instrument(skip(self, facts), fields(fact_count = facts.len()))]
    pub async fn evaluate_one(&self, rule_id: i64, facts: &FactSet) -> Result<RuleEvaluationResult> {
        let snapshot = self.repository.load_snapshot(rule_id).await?;
        self.evaluate_snapshot(&snapshot, facts).await
    }

    /// 单规则评估
    ///
    /// 缺少必需字段时在任何动作执行之前返回 `InvalidInput`。
    /// 条件全部评估（不短路），全部满足（无条件时视为满足）才分发动作。
    pub async fn evaluate_snapshot(
        &self,
        snapshot: &RuleSnapshot,
        facts: &FactSet,
    ) -> Result<RuleEvaluationResult> {
        let start = Instant::now();

        let missing = snapshot.missing_fields(facts);
        if !missing.is_empty() {
            return Err(RuleError::InvalidInput {
                rule_id: snapshot.id(),
                missing,
            });
        }

        let condition_results: Vec<_> = snapshot
            .conditions
            .iter()
            .map(|c| ConditionEvaluator::evaluate_condition(c, facts))
            .collect();
        let success = condition_results.iter().all(|r| r.matched);
        let evaluated_at = Utc::now();

        let action_results = if success {
            let context = Self::enrich_context(facts, &snapshot.rule, evaluated_at);
            self.dispatcher
                .dispatch_all(&snapshot.actions, &context)
                .await
        } else {
            Vec::new()
        };

        let elapsed = start.elapsed();
        metrics::record_rule_evaluation(success, elapsed.as_secs_f64());

        debug!(
            rule_id = snapshot.id(),
            success,
            actions = action_results.len(),
            "规则评估完成"
        );

        Ok(RuleEvaluationResult {
            rule_id: snapshot.id(),
            rule_name: snapshot.name().to_string(),
            success,
            condition_results,
            action_results,
            message: if success {
                MESSAGE_MATCHED
            } else {
                MESSAGE_NOT_MATCHED
            }
            .to_string(),
            evaluated_at,
            evaluation_time_ms: elapsed.as_millis() as i64,
        })
    }

    /// 构建动作执行上下文：复制调用方事实并附加规则 ID、名称和评估时间
    pub fn enrich_context(facts: &FactSet, rule: &Rule, evaluated_at: DateTime<Utc>) -> FactSet {
        let mut context = facts.clone();
        context.insert(CONTEXT_RULE_ID, rule.id);
        context.insert(CONTEXT_RULE_NAME, rule.name.clone());
        context.insert(CONTEXT_EVALUATED_AT, evaluated_at.to_rfc3339());
        context
    }

    /// 选出命中事件的规则 ID，按绑定顺序去重
    async fn select_candidates(&self, event_type: &str, event_params: &str) -> Result<Vec<i64>> {
        let bindings = self
            .repository
            .find_triggers_by_event_type(event_type)
            .await?;

        let mut seen = HashSet::new();
        Ok(bindings
            .iter()
            .filter(|b| b.matches(event_type, event_params))
            .map(|b| b.rule_id)
            .filter(|rule_id| seen.insert(*rule_id))
            .collect())
    }

    async fn is_enabled(&self, rule: &Rule) -> Result<bool> {
        if !rule.active {
            return Ok(false);
        }
        match self.repository.find_group(rule.group_id).await {
            Ok(group) => Ok(group.active),
            Err(RuleError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
