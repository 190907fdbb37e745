//! 规则定义加载
//!
//! 启动时从 JSON 文档批量注册规则组及其规则：
//!
//! ```json
//! {
//!   "groups": [{
//!     "name": "comfort", "priority": 1, "active": true,
//!     "rules": [{
//!       "name": "hot-day",
//!       "conditions": [{ "operator": "GT", "field": "temperature", "value": "30" }],
//!       "actions": [{ "actionType": "EMAIL", "parameters": { "to": "ops@example.com", "subject": "Hot", "body": "..." } }],
//!       "triggers": [{ "eventType": "AI_DATA_RECEIVED", "eventParams": "comfort" }]
//!     }]
//!   }]
//! }
//! ```
//!
//! 动作参数可以是字符串，也可以是内联 JSON 对象（重新编码为文本保存）。

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::Result;
use crate::models::{
    NewAction, NewCondition, NewRule, NewRuleGroup, NewRuleParameter, NewRuleSchedule,
    NewTriggerBinding,
};
use crate::repository::InMemoryRuleRepository;

/// 规则定义文档
#[derive(Debug, Default, Deserialize)]
pub struct RuleDefinitions {
    #[serde(default)]
    pub groups: Vec<GroupDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct GroupDefinition {
    #[serde(flatten)]
    pub group: NewRuleGroup,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct RuleDefinition {
    #[serde(flatten)]
    pub rule: NewRule,
    #[serde(default)]
    pub conditions: Vec<NewCondition>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub triggers: Vec<NewTriggerBinding>,
    #[serde(default)]
    pub parameters: Vec<NewRuleParameter>,
    #[serde(default)]
    pub schedules: Vec<NewRuleSchedule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub action_type: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub priority: i32,
}

impl From<ActionDefinition> for NewAction {
    fn from(def: ActionDefinition) -> Self {
        let parameters = match def.parameters {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            action_type: def.action_type,
            parameters,
            priority: def.priority,
        }
    }
}

/// 加载统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub groups: usize,
    pub rules: usize,
    pub conditions: usize,
    pub actions: usize,
    pub triggers: usize,
}

/// 规则定义加载器
pub struct RuleLoader;

impl RuleLoader {
    /// 从文件加载
    pub fn load_file(repo: &InMemoryRuleRepository, path: impl AsRef<Path>) -> Result<LoadSummary> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let summary = Self::load_str(repo, &content)?;
        info!(path = %path.display(), ?summary, "规则定义文件加载完成");
        Ok(summary)
    }

    /// 从 JSON 文本加载
    pub fn load_str(repo: &InMemoryRuleRepository, json: &str) -> Result<LoadSummary> {
        let definitions: RuleDefinitions = serde_json::from_str(json)?;
        Self::load(repo, definitions)
    }

    /// 注册文档中的全部定义
    ///
    /// 遇到第一个无效定义即停止，已注册的部分保留。
    pub fn load(repo: &InMemoryRuleRepository, definitions: RuleDefinitions) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();

        for group_def in definitions.groups {
            let group = repo.register_group(group_def.group)?;
            summary.groups += 1;

            for rule_def in group_def.rules {
                let rule = repo.register_rule(group.id, rule_def.rule)?;
                summary.rules += 1;

                for condition in rule_def.conditions {
                    repo.add_condition(rule.id, condition)?;
                    summary.conditions += 1;
                }
                for action in rule_def.actions {
                    repo.add_action(rule.id, action.into())?;
                    summary.actions += 1;
                }
                for trigger in rule_def.triggers {
                    repo.add_trigger(rule.id, trigger)?;
                    summary.triggers += 1;
                }
                for parameter in rule_def.parameters {
                    repo.add_parameter(rule.id, parameter)?;
                }
                for schedule in rule_def.schedules {
                    repo.add_schedule(rule.id, schedule)?;
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Operator;
    use crate::repository::RuleRepository;

    const DOCUMENT: &str = r#"{
        "groups": [{
            "name": "comfort",
            "description": "comfort alerts",
            "priority": 1,
            "rules": [{
                "name": "hot-day",
                "priority": 2,
                "conditions": [
                    { "operator": "gt", "field": "temperature", "value": "30" },
                    { "operator": "BETWEEN", "field": "humidity", "value": "40,80", "priority": 1 }
                ],
                "actions": [
                    { "actionType": "EMAIL", "parameters": { "to": "ops@example.com", "subject": "Hot", "body": "It is hot" } },
                    { "actionType": "LOG", "parameters": "plain text" },
                    { "actionType": "WEBHOOK" }
                ],
                "triggers": [{ "eventType": "AI_DATA_RECEIVED", "eventParams": "comfort" }],
                "parameters": [{ "name": "threshold", "value": "30" }],
                "schedules": [{ "cronExpression": "0 * * * * *" }]
            }, {
                "name": "disabled",
                "active": false
            }]
        }]
    }"#;

    #[tokio::test]
    async fn test_load_document() {
        let repo = InMemoryRuleRepository::new();
        let summary = RuleLoader::load_str(&repo, DOCUMENT).unwrap();

        assert_eq!(
            summary,
            LoadSummary {
                groups: 1,
                rules: 2,
                conditions: 2,
                actions: 3,
                triggers: 1,
            }
        );

        let rules = repo.list_rules().await.unwrap();
        let hot = rules.iter().find(|r| r.name == "hot-day").unwrap();
        assert!(hot.active);
        assert_eq!(hot.priority, 2);
        assert!(!rules.iter().find(|r| r.name == "disabled").unwrap().active);

        let details = repo.find_rule_details(hot.id).await.unwrap();
        assert_eq!(details.conditions[0].operator, Operator::Gt);
        assert_eq!(details.parameters[0].name, "threshold");
        assert!(details.schedules[0].active);

        let email: Value = serde_json::from_str(&details.actions[0].parameters).unwrap();
        assert_eq!(email["to"], "ops@example.com");
        assert_eq!(details.actions[1].parameters, "plain text");
        assert_eq!(details.actions[2].parameters, "");
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let repo = InMemoryRuleRepository::new();
        let err = RuleLoader::load_str(&repo, "{\"groups\": 1}").unwrap_err();
        assert_eq!(err.code(), "JSON_ERROR");
    }

    #[test]
    fn test_duplicate_group_names_rejected() {
        let repo = InMemoryRuleRepository::new();
        let err = RuleLoader::load_str(
            &repo,
            r#"{"groups": [{"name": "g"}, {"name": "g"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), "ALREADY_EXISTS");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let repo = InMemoryRuleRepository::new();
        let err = RuleLoader::load_file(&repo, "/nonexistent/rules.json").unwrap_err();
        assert_eq!(err.code(), "IO_ERROR");
    }
}
