//! 规则评估与动作分发引擎
//!
//! 提供：
//! - 条件评估（扁平的单字段比较）
//! - 规则编排（触发选择、输入校验、条件评估、动作分发）
//! - 可扩展的动作处理器注册表与带失败边界的分发器
//! - 异步采集缓冲区、周期批处理调度与结果缓存

pub mod action;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod notification;
pub mod operators;
pub mod orchestrator;
pub mod repository;

pub use action::{ActionDispatcher, ActionError, ActionHandler, HandlerRegistry};
pub use compiler::{RuleCompiler, RuleSnapshot};
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use ingest::{BatchScheduler, ComfortReading, CycleReport, IngestBuffer, ResultsCache};
pub use loader::RuleLoader;
pub use models::{
    Action, ActionResult, Condition, ConditionResult, FactSet, Rule, RuleEvaluationResult,
    RuleGroup, TriggerBinding,
};
pub use notification::{EmailMessage, LogNotifier, Notifier, NotifyError};
pub use operators::Operator;
pub use orchestrator::RuleOrchestrator;
pub use repository::{InMemoryRuleRepository, RuleDetails, RuleRepository};
