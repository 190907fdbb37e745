//! 规则引擎集成测试
//!
//! 从定义加载到编排、分发、批处理发布的完整工作流。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rule_engine::models::MESSAGE_MATCHED;
use rule_engine::{
    ActionDispatcher, BatchScheduler, ComfortReading, EmailMessage, FactSet, HandlerRegistry,
    InMemoryRuleRepository, IngestBuffer, Notifier, NotifyError, ResultsCache, RuleError,
    RuleLoader, RuleOrchestrator, RuleRepository,
};
use ruleflow_shared::config::SchedulerConfig;

/// 记录已发送邮件的通知实现
#[derive(Default)]
struct CapturingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

const DEFINITIONS: &str = r#"{
    "groups": [{
        "name": "weather",
        "rules": [{
            "name": "exact-temperature",
            "conditions": [{ "operator": "EQ", "field": "temperature", "value": "25" }],
            "actions": [{
                "actionType": "EMAIL",
                "parameters": { "to": "ops@example.com", "subject": "25 degrees", "body": "Right on target" }
            }],
            "triggers": [{ "eventType": "MANUAL_CHECK" }]
        }, {
            "name": "hot-and-humid",
            "conditions": [
                { "operator": "GT", "field": "temperature", "value": "30" },
                { "operator": "GTE", "field": "humidity", "value": "60" }
            ],
            "actions": [
                { "actionType": "COMFORT_NOTIFICATION" },
                { "actionType": "EMAIL", "parameters": "{broken" },
                { "actionType": "LOG", "parameters": "hot and humid" }
            ],
            "triggers": [{ "eventType": "AI_DATA_RECEIVED", "eventParams": "comfort" }]
        }, {
            "name": "seoul-only",
            "conditions": [{ "operator": "LIKE", "field": "location", "value": "Seo%" }],
            "actions": [{ "actionType": "WEBHOOK", "parameters": "https://hooks.example.com/seoul" }],
            "triggers": [{ "eventType": "AI_DATA_RECEIVED" }]
        }]
    }]
}"#;

struct Pipeline {
    repo: InMemoryRuleRepository,
    notifier: Arc<CapturingNotifier>,
    orchestrator: RuleOrchestrator,
}

fn pipeline() -> Pipeline {
    let repo = InMemoryRuleRepository::new();
    RuleLoader::load_str(&repo, DEFINITIONS).unwrap();

    let notifier = Arc::new(CapturingNotifier::default());
    let registry = HandlerRegistry::with_defaults(notifier.clone());
    let orchestrator = RuleOrchestrator::new(
        Arc::new(repo.clone()),
        ActionDispatcher::new(Arc::new(registry)),
    );

    Pipeline {
        repo,
        notifier,
        orchestrator,
    }
}

async fn rule_id(repo: &InMemoryRuleRepository, name: &str) -> i64 {
    repo.list_rules()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.name == name)
        .map(|r| r.id)
        .unwrap()
}

fn reading(location: &str, temperature: f64, humidity: f64) -> ComfortReading {
    ComfortReading {
        location: location.to_string(),
        temperature,
        humidity,
        wind_speed: 2.0,
        comfort_index: 55.0,
        comfort_grade: "POOR".to_string(),
        comment: None,
        captured_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_eq_condition_with_email_action() {
    let p = pipeline();
    let id = rule_id(&p.repo, "exact-temperature").await;

    let facts = FactSet::new().with("temperature", "25");
    let result = p.orchestrator.evaluate_one(id, &facts).await.unwrap();

    assert!(result.success);
    assert_eq!(result.message, MESSAGE_MATCHED);
    assert_eq!(result.action_results.len(), 1);
    assert_eq!(result.action_results[0].action_type, "EMAIL");
    assert!(result.action_results[0].success);

    let sent = p.notifier.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ops@example.com");
}

#[tokio::test]
async fn test_missing_field_invokes_nothing() {
    let p = pipeline();
    let id = rule_id(&p.repo, "exact-temperature").await;

    let err = p
        .orchestrator
        .evaluate_one(id, &FactSet::new().with("humidity", 50))
        .await
        .unwrap_err();

    assert!(matches!(err, RuleError::InvalidInput { .. }));
    assert!(p.notifier.sent.lock().is_empty());
}

#[tokio::test]
async fn test_trigger_with_partial_action_failure() {
    let p = pipeline();
    let facts = FactSet::new()
        .with("temperature", 33)
        .with("humidity", 70)
        .with("location", "Seoul")
        .with("comfortIndex", 40)
        .with("comfortGrade", "BAD");

    let results = p
        .orchestrator
        .evaluate_triggered("AI_DATA_RECEIVED", "comfort", &facts)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);

    let hot = &results[0];
    assert_eq!(hot.rule_name, "hot-and-humid");
    assert!(hot.success);
    let outcomes: Vec<_> = hot.action_results.iter().map(|a| a.success).collect();
    assert_eq!(outcomes, vec![true, false, true]);
    assert_eq!(
        hot.action_results[0].output.as_ref().unwrap()["comfortGrade"],
        "BAD"
    );

    let seoul = &results[1];
    assert_eq!(seoul.rule_name, "seoul-only");
    assert!(seoul.success);
    assert_eq!(seoul.action_results[0].action_type, "WEBHOOK");
}

#[tokio::test]
async fn test_removed_rule_no_longer_triggers() {
    let p = pipeline();
    let id = rule_id(&p.repo, "seoul-only").await;
    p.repo.remove_rule(id).unwrap();

    let facts = FactSet::new()
        .with("temperature", 20)
        .with("humidity", 30)
        .with("location", "Seoul");
    let results = p
        .orchestrator
        .evaluate_triggered("AI_DATA_RECEIVED", "comfort", &facts)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
}

#[tokio::test]
async fn test_batch_cycle_end_to_end() {
    let p = pipeline();
    let buffer = Arc::new(IngestBuffer::unbounded());
    let cache = Arc::new(ResultsCache::new());
    let scheduler = BatchScheduler::new(
        buffer.clone(),
        p.orchestrator.clone(),
        cache.clone(),
        &SchedulerConfig::default(),
    );

    buffer.add(reading("Seoul", 34.0, 80.0)).unwrap();
    buffer.add(reading("Busan", 18.0, 40.0)).unwrap();

    let report = scheduler.run_cycle().await;
    assert_eq!(report.records, 2);
    assert_eq!(report.results, 4);
    assert_eq!(report.failed_records, 0);

    let published = cache.get().unwrap();
    let summary: Vec<_> = published
        .results
        .iter()
        .map(|r| (r.rule_name.as_str(), r.success))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("hot-and-humid", true),
            ("seoul-only", true),
            ("hot-and-humid", false),
            ("seoul-only", false),
        ]
    );

    let notification = published.results[0].action_results[0]
        .output
        .as_ref()
        .unwrap();
    assert_eq!(notification["location"], "Seoul");
    assert_eq!(notification["comfortGrade"], "POOR");
}

#[tokio::test]
async fn test_rule_details_snapshot() {
    let p = pipeline();
    let id = rule_id(&p.repo, "hot-and-humid").await;

    let details = p.repo.find_rule_details(id).await.unwrap();
    assert_eq!(details.conditions.len(), 2);
    assert_eq!(details.actions.len(), 3);
    assert_eq!(details.triggers[0].event_params, "comfort");
}
