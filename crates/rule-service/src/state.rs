//! 应用状态定义
//!
//! 包含 Axum 路由共享的规则编排器、采集缓冲区与结果缓存

use std::sync::Arc;

use rule_engine::{
    ActionDispatcher, BatchScheduler, ComfortReading, HandlerRegistry, IngestBuffer, LogNotifier,
    ResultsCache, RuleOrchestrator, RuleRepository,
};
use ruleflow_shared::config::AppConfig;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: RuleOrchestrator,
    pub buffer: Arc<IngestBuffer<ComfortReading>>,
    pub cache: Arc<ResultsCache>,
}

impl AppState {
    pub fn new(
        orchestrator: RuleOrchestrator,
        buffer: Arc<IngestBuffer<ComfortReading>>,
        cache: Arc<ResultsCache>,
    ) -> Self {
        Self {
            orchestrator,
            buffer,
            cache,
        }
    }

    /// 按配置组装默认处理器、分发器和编排器
    pub fn from_config(config: &AppConfig, repository: Arc<dyn RuleRepository>) -> Self {
        let notifier = Arc::new(LogNotifier::new(&config.notification.from_address));
        let registry = Arc::new(HandlerRegistry::with_defaults(notifier));
        let dispatcher =
            ActionDispatcher::new(registry).with_handler_timeout(config.dispatch.handler_timeout());

        Self::new(
            RuleOrchestrator::new(repository, dispatcher),
            Arc::new(IngestBuffer::with_capacity(config.ingest.capacity())),
            Arc::new(ResultsCache::new()),
        )
    }

    pub fn repository(&self) -> &Arc<dyn RuleRepository> {
        self.orchestrator.repository()
    }

    /// 创建共享同一缓冲区和缓存的批处理调度器
    pub fn scheduler(&self, config: &AppConfig) -> BatchScheduler {
        BatchScheduler::new(
            self.buffer.clone(),
            self.orchestrator.clone(),
            self.cache.clone(),
            &config.scheduler,
        )
    }
}
