//! 规则引擎领域模型
//!
//! 包含规则定义聚合（规则组、规则、条件、动作、触发绑定、参数、调度）、
//! 评估输入（事实集）以及评估输出（条件结果、动作结果、规则评估结果）。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

use crate::error::{Result, RuleError};
use crate::operators::Operator;

/// 条件全部满足时的评估消息
pub const MESSAGE_MATCHED: &str = "conditions satisfied, actions executed";
/// 条件未满足时的评估消息
pub const MESSAGE_NOT_MATCHED: &str = "conditions not satisfied, actions skipped";

// ==================== 规则定义 ====================

/// 规则组
///
/// 规则组拥有其下所有规则，删除规则组时级联删除规则及其附属实体。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub active: bool,
    /// 组内规则 ID，从列表移除即删除对应规则
    pub rule_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 规则
///
/// priority 数值越小优先级越高。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 条件：针对单个事实字段的比较谓词
///
/// priority 仅作为评估顺序提示，规则结果始终是全部条件的 AND。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: i64,
    pub rule_id: i64,
    pub operator: Operator,
    pub field: String,
    /// 比较值，统一以文本保存
    pub value: String,
    pub priority: i32,
}

/// 动作：规则匹配后执行的副作用
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: i64,
    pub rule_id: i64,
    /// 动作类型标签（EMAIL、WEBHOOK、COMFORT_NOTIFICATION、LOG ...），运行时按能力匹配处理器
    pub action_type: String,
    /// 动作参数，通常是编码后的 JSON 文本
    pub parameters: String,
    pub priority: i32,
}

/// 触发绑定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerBinding {
    pub id: i64,
    pub rule_id: i64,
    pub event_type: String,
    /// 事件参数过滤，空串表示不过滤
    pub event_params: String,
}

impl TriggerBinding {
    /// 判断触发事件是否命中该绑定
    ///
    /// 事件类型必须完全相等；过滤串为空或被事件参数包含即视为命中。
    pub fn matches(&self, event_type: &str, event_params: &str) -> bool {
        self.event_type == event_type
            && (self.event_params.is_empty() || event_params.contains(self.event_params.as_str()))
    }
}

/// 规则参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleParameter {
    pub id: i64,
    pub rule_id: i64,
    pub name: String,
    pub value: String,
}

/// 规则调度
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSchedule {
    pub id: i64,
    pub rule_id: i64,
    pub cron_expression: String,
    pub active: bool,
}

// ==================== 注册请求 ====================

fn default_active() -> bool {
    true
}

/// 规则组注册请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRuleGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// 规则注册请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// 规则基本信息修改请求，None 表示不修改
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCondition {
    pub operator: Operator,
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAction {
    pub action_type: String,
    #[serde(default)]
    pub parameters: String,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTriggerBinding {
    pub event_type: String,
    #[serde(default)]
    pub event_params: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRuleParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRuleSchedule {
    pub cron_expression: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

// ==================== 评估输入 ====================

/// 事实集：字段名到标量值的映射
///
/// 由调用方提供或由缓冲记录转换而来，只在一次评估期间存在。
/// 从 JSON 构建时拒绝数组和对象值。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FactSet(BTreeMap<String, Value>);

impl<'de> Deserialize<'de> for FactSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Self::from_map(map).map_err(de::Error::custom)
    }
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::from_map(map.into_iter().collect()),
            other => Err(RuleError::Validation(format!(
                "事实集必须是 JSON 对象, 实际为 {}",
                other
            ))),
        }
    }

    fn from_map(map: BTreeMap<String, Value>) -> Result<Self> {
        match map.iter().find(|(_, v)| v.is_array() || v.is_object()) {
            Some((field, _)) => Err(RuleError::Validation(format!(
                "事实字段 {} 必须是标量值",
                field
            ))),
            None => Ok(Self(map)),
        }
    }

    /// 链式添加字段
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// 获取字段值，null 视为不存在
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// 获取字段的文本形式
    ///
    /// 字符串原样返回，数字和布尔值使用其显示形式。
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for FactSet
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ==================== 评估输出 ====================

/// 单个条件的评估结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionResult {
    pub condition_id: i64,
    pub field: String,
    pub operator: Operator,
    pub value: String,
    pub matched: bool,
}

/// 单次动作分发的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub action_id: i64,
    pub action_type: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub executed_at: DateTime<Utc>,
}

impl ActionResult {
    /// 创建成功结果
    pub fn success(action: &Action, message: impl Into<String>) -> Self {
        Self {
            action_id: action.id,
            action_type: action.action_type.clone(),
            success: true,
            message: message.into(),
            output: None,
            executed_at: Utc::now(),
        }
    }

    /// 创建失败结果
    pub fn failure(action: &Action, message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::success(action, message)
        }
    }

    /// 附加输出数据
    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }
}

/// 规则评估结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluationResult {
    pub rule_id: i64,
    pub rule_name: String,
    /// 全部条件满足（无条件时恒为 true）
    pub success: bool,
    pub condition_results: Vec<ConditionResult>,
    /// 仅在 success 为 true 时填充
    pub action_results: Vec<ActionResult>,
    pub message: String,
    pub evaluated_at: DateTime<Utc>,
    pub evaluation_time_ms: i64,
}

impl RuleEvaluationResult {
    /// 评估在产生条件结果之前即失败（如缺少事实字段）时使用
    pub fn rejected(rule: &Rule, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule.id,
            rule_name: rule.name.clone(),
            success: false,
            condition_results: Vec::new(),
            action_results: Vec::new(),
            message: message.into(),
            evaluated_at: Utc::now(),
            evaluation_time_ms: 0,
        }
    }
}
