//! 规则快照编译
//!
//! 将规则及其条件、动作组装为一次评估使用的一致快照，并预先提取必需字段集合。

use std::collections::BTreeSet;

use crate::models::{Action, Condition, FactSet, Rule};

/// 编译后的规则快照
///
/// 条件与动作按 priority 升序排列（相同 priority 按 id），
/// 保证同一快照多次评估时的顺序稳定。
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub rule: Rule,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    /// 条件引用的全部非空字段（去重、有序）
    pub required_fields: BTreeSet<String>,
}

impl RuleSnapshot {
    /// 获取规则 ID
    pub fn id(&self) -> i64 {
        self.rule.id
    }

    /// 获取规则名称
    pub fn name(&self) -> &str {
        &self.rule.name
    }

    /// 返回事实集中缺失的必需字段
    pub fn missing_fields(&self, facts: &FactSet) -> Vec<String> {
        self.required_fields
            .iter()
            .filter(|field| !facts.contains(field))
            .cloned()
            .collect()
    }
}

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译规则快照
    pub fn compile(
        rule: Rule,
        mut conditions: Vec<Condition>,
        mut actions: Vec<Action>,
    ) -> RuleSnapshot {
        conditions.sort_by_key(|c| (c.priority, c.id));
        actions.sort_by_key(|a| (a.priority, a.id));

        let required_fields = Self::extract_fields(&conditions);

        RuleSnapshot {
            rule,
            conditions,
            actions,
            required_fields,
        }
    }

    /// 提取条件中引用的所有字段
    fn extract_fields(conditions: &[Condition]) -> BTreeSet<String> {
        conditions
            .iter()
            .filter(|c| !c.field.trim().is_empty())
            .map(|c| c.field.clone())
            .collect()
    }
}
