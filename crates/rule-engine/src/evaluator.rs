//! 条件评估器
//!
//! 实现各操作符的评估逻辑。评估是纯函数且从不失败：
//! 字段缺失、数值解析失败、模式非法都降级为不匹配，不会影响同一规则中其他条件的评估。

use regex::Regex;

use crate::models::{Condition, ConditionResult, FactSet};
use crate::operators::Operator;

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 评估条件
    ///
    /// # Arguments
    /// * `operator` - 操作符
    /// * `field_value` - 从事实集中获取的字段文本，字段不存在时为 None
    /// * `comparison` - 条件中定义的比较值
    pub fn evaluate(operator: Operator, field_value: Option<&str>, comparison: &str) -> bool {
        // 字段不存在时所有操作符都返回 false
        let Some(value) = field_value else {
            return false;
        };

        match operator {
            Operator::Eq => value == comparison,
            Operator::Ne => value != comparison,
            Operator::Gt => Self::compare(value, comparison, |a, b| a > b),
            Operator::Lt => Self::compare(value, comparison, |a, b| a < b),
            Operator::Gte => Self::compare(value, comparison, |a, b| a >= b),
            Operator::Lte => Self::compare(value, comparison, |a, b| a <= b),
            // IN / NOT_IN 是子串包含判断，而不是集合成员判断
            Operator::In => value.contains(comparison),
            Operator::NotIn => !value.contains(comparison),
            Operator::Like => Self::like(value, comparison),
            Operator::NotLike => !Self::like(value, comparison),
            Operator::Between => Self::between(value, comparison),
            Operator::Unknown => false,
        }
    }

    /// 针对事实集评估一个条件，并生成条件结果快照
    pub fn evaluate_condition(condition: &Condition, facts: &FactSet) -> ConditionResult {
        let field_value = facts.text(&condition.field);
        let matched = Self::evaluate(condition.operator, field_value.as_deref(), &condition.value);

        ConditionResult {
            condition_id: condition.id,
            field: condition.field.clone(),
            operator: condition.operator,
            value: condition.value.clone(),
            matched,
        }
    }

    /// 数值比较，任一侧无法解析为浮点数时返回 false
    fn compare<F>(value: &str, comparison: &str, cmp: F) -> bool
    where
        F: Fn(f64, f64) -> bool,
    {
        match (Self::as_f64(value), Self::as_f64(comparison)) {
            (Some(a), Some(b)) => cmp(a, b),
            _ => false,
        }
    }

    /// 闭区间判断，比较值格式为 "low,high"
    fn between(value: &str, range: &str) -> bool {
        let Some((low, high)) = range.split_once(',') else {
            return false;
        };

        match (Self::as_f64(value), Self::as_f64(low), Self::as_f64(high)) {
            (Some(v), Some(low), Some(high)) => low <= v && v <= high,
            _ => false,
        }
    }

    /// 简化的 SQL 模式匹配
    ///
    /// `%` 替换为 `.*` 后按正则整体匹配；模式非法时返回 false。
    fn like(value: &str, pattern: &str) -> bool {
        let regex = format!("^(?:{})$", pattern.replace('%', ".*"));
        match Regex::new(&regex) {
            Ok(re) => re.is_match(value),
            Err(e) => {
                tracing::debug!(pattern = %pattern, error = %e, "LIKE 模式无法编译，视为不匹配");
                false
            }
        }
    }

    fn as_f64(s: &str) -> Option<f64> {
        s.trim().parse::<f64>().ok()
    }
}
