//! 规则仓储
//!
//! 核心只依赖 "按 ID 查找（不存在即 NotFound）" 与 "按关联查找全部" 两类操作，
//! 不关心具体存储引擎。`InMemoryRuleRepository` 使用 DashMap 提供线程安全的内存实现，
//! 并在写入时维护聚合不变量：条件、动作、触发绑定等必须挂在已存在的规则上，
//! 规则必须挂在已存在的规则组上。

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::compiler::{RuleCompiler, RuleSnapshot};
use crate::error::{Result, RuleError};
use crate::models::{
    Action, Condition, NewAction, NewCondition, NewRule, NewRuleGroup, NewRuleParameter,
    NewRuleSchedule, NewTriggerBinding, Rule, RuleGroup, RuleParameter, RuleSchedule, RuleUpdate,
    TriggerBinding,
};

/// 规则详情（只读浏览用）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDetails {
    pub rule: Rule,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    pub triggers: Vec<TriggerBinding>,
    pub parameters: Vec<RuleParameter>,
    pub schedules: Vec<RuleSchedule>,
}

/// 规则仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn find_rule(&self, rule_id: i64) -> Result<Rule>;
    async fn find_group(&self, group_id: i64) -> Result<RuleGroup>;
    async fn find_conditions(&self, rule_id: i64) -> Result<Vec<Condition>>;
    async fn find_actions(&self, rule_id: i64) -> Result<Vec<Action>>;
    async fn find_triggers(&self, rule_id: i64) -> Result<Vec<TriggerBinding>>;
    async fn find_parameters(&self, rule_id: i64) -> Result<Vec<RuleParameter>>;
    async fn find_schedules(&self, rule_id: i64) -> Result<Vec<RuleSchedule>>;

    /// 查找指定事件类型的全部触发绑定，按绑定 ID 升序
    async fn find_triggers_by_event_type(&self, event_type: &str) -> Result<Vec<TriggerBinding>>;

    async fn list_rules(&self) -> Result<Vec<Rule>>;

    /// 读取一次评估使用的规则快照
    ///
    /// 默认实现逐个查询；需要原子快照的存储应覆盖此方法。
    async fn load_snapshot(&self, rule_id: i64) -> Result<RuleSnapshot> {
        let rule = self.find_rule(rule_id).await?;
        let conditions = self.find_conditions(rule_id).await?;
        let actions = self.find_actions(rule_id).await?;
        Ok(RuleCompiler::compile(rule, conditions, actions))
    }

    /// 读取规则详情
    async fn find_rule_details(&self, rule_id: i64) -> Result<RuleDetails> {
        Ok(RuleDetails {
            rule: self.find_rule(rule_id).await?,
            conditions: self.find_conditions(rule_id).await?,
            actions: self.find_actions(rule_id).await?,
            triggers: self.find_triggers(rule_id).await?,
            parameters: self.find_parameters(rule_id).await?,
            schedules: self.find_schedules(rule_id).await?,
        })
    }
}

/// 规则聚合：规则及其拥有的全部附属实体
///
/// 同一条目在 DashMap 的同一分片锁下读写，保证单条规则的读取是一致快照。
#[derive(Debug, Clone)]
struct RuleEntry {
    rule: Rule,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
    triggers: Vec<TriggerBinding>,
    parameters: Vec<RuleParameter>,
    schedules: Vec<RuleSchedule>,
}

impl RuleEntry {
    fn new(rule: Rule) -> Self {
        Self {
            rule,
            conditions: Vec::new(),
            actions: Vec::new(),
            triggers: Vec::new(),
            parameters: Vec::new(),
            schedules: Vec::new(),
        }
    }
}

/// 内存规则仓储
#[derive(Clone, Default)]
pub struct InMemoryRuleRepository {
    groups: Arc<DashMap<i64, RuleGroup>>,
    /// 组名索引，保证组名唯一
    group_names: Arc<DashMap<String, i64>>,
    rules: Arc<DashMap<i64, RuleEntry>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryRuleRepository {
    /// 创建空仓储
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn require_non_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(RuleError::Validation(format!("{} 不能为空", field)));
        }
        Ok(())
    }

    /// 在规则聚合上执行修改，规则不存在时返回 NotFound
    fn with_rule_mut<T>(&self, rule_id: i64, f: impl FnOnce(&mut RuleEntry) -> T) -> Result<T> {
        let mut entry = self
            .rules
            .get_mut(&rule_id)
            .ok_or_else(|| RuleError::not_found("Rule", rule_id))?;
        Ok(f(entry.value_mut()))
    }

    fn with_rule<T>(&self, rule_id: i64, f: impl FnOnce(&RuleEntry) -> T) -> Result<T> {
        let entry = self
            .rules
            .get(&rule_id)
            .ok_or_else(|| RuleError::not_found("Rule", rule_id))?;
        Ok(f(entry.value()))
    }

    /// 注册规则组，组名全局唯一
    #[instrument(skip(self, group), fields(group_name = %group.name))]
    pub fn register_group(&self, group: NewRuleGroup) -> Result<RuleGroup> {
        Self::require_non_empty(&group.name, "规则组名称")?;

        // 持有组名条目锁直到规则组写入完成，并发注册同名规则组只有一个成功
        let name_slot = match self.group_names.entry(group.name.clone()) {
            Entry::Occupied(_) => {
                return Err(RuleError::AlreadyExists {
                    entity: "RuleGroup",
                    field: "name",
                    value: group.name,
                });
            }
            Entry::Vacant(slot) => slot,
        };

        let now = Utc::now();
        let created = RuleGroup {
            id: self.allocate_id(),
            name: group.name,
            description: group.description,
            priority: group.priority,
            active: group.active,
            rule_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.groups.insert(created.id, created.clone());
        name_slot.insert(created.id);
        info!(group_id = created.id, "规则组已注册");
        Ok(created)
    }

    /// 在已存在的规则组下注册规则
    #[instrument(skip(self, rule), fields(rule_name = %rule.name))]
    pub fn register_rule(&self, group_id: i64, rule: NewRule) -> Result<Rule> {
        Self::require_non_empty(&rule.name, "规则名称")?;

        // 持有规则组条目锁直到规则写入完成，避免与删除规则组交错
        let mut group = self
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| RuleError::not_found("RuleGroup", group_id))?;

        let now = Utc::now();
        let created = Rule {
            id: self.allocate_id(),
            group_id,
            name: rule.name,
            description: rule.description,
            priority: rule.priority,
            active: rule.active,
            created_at: now,
            updated_at: now,
        };

        self.rules.insert(created.id, RuleEntry::new(created.clone()));
        group.rule_ids.push(created.id);
        group.updated_at = now;

        info!(rule_id = created.id, group_id, "规则已注册");
        Ok(created)
    }

    pub fn add_condition(&self, rule_id: i64, condition: NewCondition) -> Result<Condition> {
        let id = self.allocate_id();
        self.with_rule_mut(rule_id, |entry| {
            let created = Condition {
                id,
                rule_id,
                operator: condition.operator,
                field: condition.field,
                value: condition.value,
                priority: condition.priority,
            };
            entry.conditions.push(created.clone());
            created
        })
    }

    pub fn add_action(&self, rule_id: i64, action: NewAction) -> Result<Action> {
        Self::require_non_empty(&action.action_type, "动作类型")?;
        let id = self.allocate_id();
        self.with_rule_mut(rule_id, |entry| {
            let created = Action {
                id,
                rule_id,
                action_type: action.action_type,
                parameters: action.parameters,
                priority: action.priority,
            };
            entry.actions.push(created.clone());
            created
        })
    }

    pub fn add_trigger(&self, rule_id: i64, trigger: NewTriggerBinding) -> Result<TriggerBinding> {
        Self::require_non_empty(&trigger.event_type, "触发事件类型")?;
        let id = self.allocate_id();
        self.with_rule_mut(rule_id, |entry| {
            let created = TriggerBinding {
                id,
                rule_id,
                event_type: trigger.event_type,
                event_params: trigger.event_params,
            };
            entry.triggers.push(created.clone());
            created
        })
    }

    pub fn add_parameter(&self, rule_id: i64, parameter: NewRuleParameter) -> Result<RuleParameter> {
        Self::require_non_empty(&parameter.name, "参数名称")?;
        let id = self.allocate_id();
        self.with_rule_mut(rule_id, |entry| {
            let created = RuleParameter {
                id,
                rule_id,
                name: parameter.name,
                value: parameter.value,
            };
            entry.parameters.push(created.clone());
            created
        })
    }

    pub fn add_schedule(&self, rule_id: i64, schedule: NewRuleSchedule) -> Result<RuleSchedule> {
        Self::require_non_empty(&schedule.cron_expression, "调度表达式")?;
        let id = self.allocate_id();
        self.with_rule_mut(rule_id, |entry| {
            let created = RuleSchedule {
                id,
                rule_id,
                cron_expression: schedule.cron_expression,
                active: schedule.active,
            };
            entry.schedules.push(created.clone());
            created
        })
    }

    /// 修改规则名称、描述或优先级
    #[instrument(skip(self, update))]
    pub fn update_rule(&self, rule_id: i64, update: RuleUpdate) -> Result<Rule> {
        if let Some(name) = &update.name {
            Self::require_non_empty(name, "规则名称")?;
        }

        self.with_rule_mut(rule_id, |entry| {
            if let Some(name) = update.name {
                entry.rule.name = name;
            }
            if let Some(description) = update.description {
                entry.rule.description = description;
            }
            if let Some(priority) = update.priority {
                entry.rule.priority = priority;
            }
            entry.rule.updated_at = Utc::now();
            entry.rule.clone()
        })
    }

    /// 启用或停用规则
    #[instrument(skip(self))]
    pub fn set_rule_active(&self, rule_id: i64, active: bool) -> Result<Rule> {
        self.with_rule_mut(rule_id, |entry| {
            entry.rule.active = active;
            entry.rule.updated_at = Utc::now();
            entry.rule.clone()
        })
    }

    /// 启用或停用规则组
    #[instrument(skip(self))]
    pub fn set_group_active(&self, group_id: i64, active: bool) -> Result<RuleGroup> {
        let mut group = self
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| RuleError::not_found("RuleGroup", group_id))?;
        group.active = active;
        group.updated_at = Utc::now();
        Ok(group.clone())
    }

    /// 从规则组中移除规则，规则及其附属实体随之删除
    #[instrument(skip(self))]
    pub fn remove_rule(&self, rule_id: i64) -> Result<()> {
        let Some((_, entry)) = self.rules.remove(&rule_id) else {
            warn!("删除不存在的规则: {}", rule_id);
            return Err(RuleError::not_found("Rule", rule_id));
        };

        if let Some(mut group) = self.groups.get_mut(&entry.rule.group_id) {
            group.rule_ids.retain(|id| *id != rule_id);
            group.updated_at = Utc::now();
        }

        info!(
            conditions = entry.conditions.len(),
            actions = entry.actions.len(),
            triggers = entry.triggers.len(),
            "规则已删除"
        );
        Ok(())
    }

    /// 删除规则组并级联删除其下全部规则，返回删除的规则数量
    #[instrument(skip(self))]
    pub fn remove_group(&self, group_id: i64) -> Result<usize> {
        let (_, group) = self
            .groups
            .remove(&group_id)
            .ok_or_else(|| RuleError::not_found("RuleGroup", group_id))?;
        self.group_names.remove(&group.name);

        let removed = group
            .rule_ids
            .iter()
            .filter(|rule_id| self.rules.remove(rule_id).is_some())
            .count();

        info!(removed, "规则组已删除");
        Ok(removed)
    }

    /// 获取当前规则数量
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 获取当前规则组数量
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// 获取仓储统计信息
    pub fn stats(&self) -> RepositoryStats {
        let mut stats = RepositoryStats {
            groups_count: self.groups.len(),
            ..Default::default()
        };
        for entry in self.rules.iter() {
            stats.rules_count += 1;
            stats.conditions_count += entry.conditions.len();
            stats.actions_count += entry.actions.len();
            stats.triggers_count += entry.triggers.len();
        }
        stats
    }
}

/// 仓储统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub groups_count: usize,
    pub rules_count: usize,
    pub conditions_count: usize,
    pub actions_count: usize,
    pub triggers_count: usize,
}

#[async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn find_rule(&self, rule_id: i64) -> Result<Rule> {
        self.with_rule(rule_id, |entry| entry.rule.clone())
    }

    async fn find_group(&self, group_id: i64) -> Result<RuleGroup> {
        self.groups
            .get(&group_id)
            .map(|g| g.clone())
            .ok_or_else(|| RuleError::not_found("RuleGroup", group_id))
    }

    async fn find_conditions(&self, rule_id: i64) -> Result<Vec<Condition>> {
        self.with_rule(rule_id, |entry| entry.conditions.clone())
    }

    async fn find_actions(&self, rule_id: i64) -> Result<Vec<Action>> {
        self.with_rule(rule_id, |entry| entry.actions.clone())
    }

    async fn find_triggers(&self, rule_id: i64) -> Result<Vec<TriggerBinding>> {
        self.with_rule(rule_id, |entry| entry.triggers.clone())
    }

    async fn find_parameters(&self, rule_id: i64) -> Result<Vec<RuleParameter>> {
        self.with_rule(rule_id, |entry| entry.parameters.clone())
    }

    async fn find_schedules(&self, rule_id: i64) -> Result<Vec<RuleSchedule>> {
        self.with_rule(rule_id, |entry| entry.schedules.clone())
    }

    async fn find_triggers_by_event_type(&self, event_type: &str) -> Result<Vec<TriggerBinding>> {
        let mut triggers: Vec<TriggerBinding> = self
            .rules
            .iter()
            .flat_map(|entry| {
                entry
                    .triggers
                    .iter()
                    .filter(|t| t.event_type == event_type)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();
        triggers.sort_by_key(|t| t.id);
        Ok(triggers)
    }

    async fn list_rules(&self) -> Result<Vec<Rule>> {
        let mut rules: Vec<Rule> = self.rules.iter().map(|e| e.rule.clone()).collect();
        rules.sort_by_key(|r| (r.priority, r.id));
        Ok(rules)
    }

    async fn load_snapshot(&self, rule_id: i64) -> Result<RuleSnapshot> {
        let (rule, conditions, actions) = self.with_rule(rule_id, |entry| {
            (
                entry.rule.clone(),
                entry.conditions.clone(),
                entry.actions.clone(),
            )
        })?;
        Ok(RuleCompiler::compile(rule, conditions, actions))
    }

    async fn find_rule_details(&self, rule_id: i64) -> Result<RuleDetails> {
        self.with_rule(rule_id, |entry| RuleDetails {
            rule: entry.rule.clone(),
            conditions: entry.conditions.clone(),
            actions: entry.actions.clone(),
            triggers: entry.triggers.clone(),
            parameters: entry.parameters.clone(),
            schedules: entry.schedules.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Operator;

    fn group(repo: &InMemoryRuleRepository, name: &str) -> RuleGroup {
        repo.register_group(NewRuleGroup {
            name: name.to_string(),
            active: true,
            ..Default::default()
        })
        .unwrap()
    }

    fn rule(repo: &InMemoryRuleRepository, group_id: i64, name: &str) -> Rule {
        repo.register_rule(
            group_id,
            NewRule {
                name: name.to_string(),
                active: true,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn eq_condition(field: &str, value: &str) -> NewCondition {
        NewCondition {
            operator: Operator::Eq,
            field: field.to_string(),
            value: value.to_string(),
            priority: 0,
        }
    }

    #[tokio::test]
    async fn test_register_and_find_rule() {
        let repo = InMemoryRuleRepository::new();
        let g = group(&repo, "comfort");
        let r = rule(&repo, g.id, "hot-day");

        let found = repo.find_rule(r.id).await.unwrap();
        assert_eq!(found.name, "hot-day");
        assert_eq!(found.group_id, g.id);

        let g = repo.find_group(g.id).await.unwrap();
        assert_eq!(g.rule_ids, vec![r.id]);
    }

    #[test]
    fn test_group_name_must_be_unique() {
        let repo = InMemoryRuleRepository::new();
        group(&repo, "comfort");

        let err = repo
            .register_group(NewRuleGroup {
                name: "comfort".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.code(), "ALREADY_EXISTS");
    }

    #[test]
    fn test_concurrent_group_registration_keeps_name_unique() {
        use std::sync::Barrier;
        use std::thread;

        let repo = InMemoryRuleRepository::new();
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    repo.register_group(NewRuleGroup {
                        name: "comfort".to_string(),
                        ..Default::default()
                    })
                    .is_ok()
                })
            })
            .collect();

        let registered = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(registered, 1);
        assert_eq!(repo.group_count(), 1);
    }

    #[test]
    fn test_group_name_reusable_after_removal() {
        let repo = InMemoryRuleRepository::new();
        let g = group(&repo, "comfort");
        repo.remove_group(g.id).unwrap();

        let again = group(&repo, "comfort");
        assert_ne!(again.id, g.id);
        assert_eq!(repo.group_count(), 1);
    }

    #[test]
    fn test_rule_requires_existing_group() {
        let repo = InMemoryRuleRepository::new();
        let err = repo
            .register_rule(
                42,
                NewRule {
                    name: "orphan".to_string(),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, RuleError::NotFound { entity: "RuleGroup", id: 42 }));
    }

    #[test]
    fn test_children_require_existing_rule() {
        let repo = InMemoryRuleRepository::new();

        assert!(repo.add_condition(99, eq_condition("a", "b")).is_err());
        assert!(
            repo.add_action(
                99,
                NewAction {
                    action_type: "LOG".to_string(),
                    parameters: String::new(),
                    priority: 0,
                },
            )
            .is_err()
        );
        assert!(
            repo.add_trigger(
                99,
                NewTriggerBinding {
                    event_type: "AI_DATA_RECEIVED".to_string(),
                    event_params: String::new(),
                },
            )
            .is_err()
        );
    }

    #[test]
    fn test_empty_names_rejected() {
        let repo = InMemoryRuleRepository::new();
        let err = repo.register_group(NewRuleGroup::default()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let g = group(&repo, "g");
        let r = rule(&repo, g.id, "r");
        let err = repo
            .add_action(
                r.id,
                NewAction {
                    action_type: " ".to_string(),
                    parameters: String::new(),
                    priority: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_and_toggle_rule() {
        let repo = InMemoryRuleRepository::new();
        let g = group(&repo, "g");
        let r = rule(&repo, g.id, "before");

        let updated = repo
            .update_rule(
                r.id,
                RuleUpdate {
                    name: Some("after".to_string()),
                    priority: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "after");
        assert_eq!(updated.priority, 5);

        repo.set_rule_active(r.id, false).unwrap();
        assert!(!repo.find_rule(r.id).await.unwrap().active);
    }

    #[tokio::test]
    async fn test_remove_rule_detaches_from_group_and_cascades() {
        let repo = InMemoryRuleRepository::new();
        let g = group(&repo, "g");
        let r = rule(&repo, g.id, "r");
        repo.add_condition(r.id, eq_condition("temperature", "25")).unwrap();

        repo.remove_rule(r.id).unwrap();

        assert!(repo.find_rule(r.id).await.is_err());
        assert!(repo.find_conditions(r.id).await.is_err());
        assert!(repo.find_group(g.id).await.unwrap().rule_ids.is_empty());
        assert!(repo.remove_rule(r.id).is_err());
    }

    #[tokio::test]
    async fn test_remove_group_cascades_rules() {
        let repo = InMemoryRuleRepository::new();
        let g = group(&repo, "g");
        let r1 = rule(&repo, g.id, "r1");
        let r2 = rule(&repo, g.id, "r2");
        let other = group(&repo, "other");
        let kept = rule(&repo, other.id, "kept");

        assert_eq!(repo.remove_group(g.id).unwrap(), 2);
        assert!(repo.find_rule(r1.id).await.is_err());
        assert!(repo.find_rule(r2.id).await.is_err());
        assert!(repo.find_rule(kept.id).await.is_ok());
        assert_eq!(repo.rule_count(), 1);
        assert_eq!(repo.group_count(), 1);
    }

    #[tokio::test]
    async fn test_find_triggers_by_event_type_sorted_by_id() {
        let repo = InMemoryRuleRepository::new();
        let g = group(&repo, "g");
        let r1 = rule(&repo, g.id, "r1");
        let r2 = rule(&repo, g.id, "r2");

        let t2 = repo
            .add_trigger(
                r2.id,
                NewTriggerBinding {
                    event_type: "AI_DATA_RECEIVED".to_string(),
                    event_params: String::new(),
                },
            )
            .unwrap();
        let t1 = repo
            .add_trigger(
                r1.id,
                NewTriggerBinding {
                    event_type: "AI_DATA_RECEIVED".to_string(),
                    event_params: "comfort".to_string(),
                },
            )
            .unwrap();
        repo.add_trigger(
            r1.id,
            NewTriggerBinding {
                event_type: "MANUAL".to_string(),
                event_params: String::new(),
            },
        )
        .unwrap();

        let found = repo
            .find_triggers_by_event_type("AI_DATA_RECEIVED")
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![t2.id, t1.id]);
    }

    #[tokio::test]
    async fn test_load_snapshot_and_details() {
        let repo = InMemoryRuleRepository::new();
        let g = group(&repo, "g");
        let r = rule(&repo, g.id, "r");
        repo.add_condition(r.id, eq_condition("temperature", "25")).unwrap();
        repo.add_parameter(
            r.id,
            NewRuleParameter {
                name: "threshold".to_string(),
                value: "25".to_string(),
            },
        )
        .unwrap();
        repo.add_schedule(
            r.id,
            NewRuleSchedule {
                cron_expression: "0 * * * * *".to_string(),
                active: true,
            },
        )
        .unwrap();

        let snapshot = repo.load_snapshot(r.id).await.unwrap();
        assert_eq!(snapshot.conditions.len(), 1);
        assert!(snapshot.required_fields.contains("temperature"));

        let details = repo.find_rule_details(r.id).await.unwrap();
        assert_eq!(details.parameters.len(), 1);
        assert_eq!(details.schedules.len(), 1);

        assert_eq!(
            repo.stats(),
            RepositoryStats {
                groups_count: 1,
                rules_count: 1,
                conditions_count: 1,
                actions_count: 0,
                triggers_count: 0,
            }
        );
    }

    #[test]
    fn test_concurrent_registration() {
        use std::thread;

        let repo = InMemoryRuleRepository::new();
        let g = group(&repo, "g");

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let repo = repo.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let r = rule(&repo, g.id, &format!("rule-{}-{}", t, i));
                        repo.add_condition(r.id, eq_condition("f", "v")).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(repo.rule_count(), 200);
        let group = repo.groups.get(&g.id).unwrap();
        assert_eq!(group.rule_ids.len(), 200);
    }
}
