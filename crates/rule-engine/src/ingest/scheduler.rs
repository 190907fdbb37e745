//! 批处理调度器
//!
//! 按固定周期取走采集缓冲区的全部记录，逐条以固定的触发事件送入规则编排器，
//! 按记录顺序拼接评估结果后一次性发布到结果缓存。
//! 调度器是缓冲区唯一的消费者，也是结果缓存唯一的写入者。

use std::sync::Arc;
use std::time::{Duration, Instant};

use ruleflow_shared::config::SchedulerConfig;
use ruleflow_shared::observability::metrics;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::ingest::buffer::IngestBuffer;
use crate::ingest::cache::ResultsCache;
use crate::ingest::record::ComfortReading;
use crate::orchestrator::RuleOrchestrator;

const WORKER_NAME: &str = "batch_scheduler";

/// 单个批处理周期的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// 取出的记录数
    pub records: usize,
    /// 发布的评估结果数
    pub results: usize,
    /// 评估出错被跳过的记录数
    pub failed_records: usize,
}

/// 批处理调度器
pub struct BatchScheduler {
    buffer: Arc<IngestBuffer<ComfortReading>>,
    orchestrator: RuleOrchestrator,
    cache: Arc<ResultsCache>,
    interval: Duration,
    event_type: String,
    event_params: String,
}

impl BatchScheduler {
    pub fn new(
        buffer: Arc<IngestBuffer<ComfortReading>>,
        orchestrator: RuleOrchestrator,
        cache: Arc<ResultsCache>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            buffer,
            orchestrator,
            cache,
            interval: config.interval(),
            event_type: config.event_type.clone(),
            event_params: config.event_params.clone(),
        }
    }

    /// 执行一个批处理周期
    ///
    /// 单条记录评估失败只记录日志并跳过，不影响同批其他记录。
    /// 无论是否取到记录都会发布（空批次发布空列表）。
    #[instrument(skip(self), name = "batch_cycle")]
    pub async fn run_cycle(&self) -> CycleReport {
        let start = Instant::now();
        let records = self.buffer.drain_all();
        let mut report = CycleReport {
            records: records.len(),
            ..Default::default()
        };

        let mut published = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let facts = record.to_facts();
            match self
                .orchestrator
                .evaluate_triggered(&self.event_type, &self.event_params, &facts)
                .await
            {
                Ok(results) => published.extend(results),
                Err(e) => {
                    report.failed_records += 1;
                    error!(
                        index,
                        location = %record.location,
                        error = %e,
                        "批处理记录评估失败，跳过"
                    );
                }
            }
        }

        report.results = published.len();
        self.cache.set(published);

        metrics::record_batch_cycle(
            report.records,
            report.results,
            start.elapsed().as_secs_f64(),
        );

        if report.records > 0 {
            info!(
                records = report.records,
                results = report.results,
                failed = report.failed_records,
                "批处理周期完成"
            );
        } else {
            debug!("批处理周期完成，缓冲区为空");
        }

        report
    }

    /// 在后台按周期运行，直到收到 shutdown 信号
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + self.interval,
                self.interval,
            );
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                interval = ?self.interval,
                event_type = %self.event_type,
                event_params = %self.event_params,
                "批处理调度器已启动"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_cycle().await;
                        metrics::set_worker_last_run(WORKER_NAME);
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("批处理调度器已停止");
        })
    }
}
