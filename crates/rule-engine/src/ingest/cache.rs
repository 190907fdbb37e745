//! 批处理结果缓存
//!
//! 单槽位：只保存最近一次批处理周期发布的完整结果列表，不保留历史。
//! 发布是一次原子替换，读者要么看到旧列表，要么看到新列表。

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::RuleEvaluationResult;

/// 一次发布的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedResults {
    pub results: Vec<RuleEvaluationResult>,
    pub published_at: DateTime<Utc>,
}

/// 结果缓存
#[derive(Default)]
pub struct ResultsCache {
    slot: ArcSwapOption<PublishedResults>,
}

impl ResultsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取最近一次发布的结果，尚未发布时返回 None
    pub fn get(&self) -> Option<Arc<PublishedResults>> {
        self.slot.load_full()
    }

    /// 原子替换缓存内容
    pub fn set(&self, results: Vec<RuleEvaluationResult>) {
        self.slot.store(Some(Arc::new(PublishedResults {
            results,
            published_at: Utc::now(),
        })));
    }
}
