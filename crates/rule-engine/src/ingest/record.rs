//! 缓冲记录
//!
//! 外部推送的舒适度采集数据，批处理时转换为事实集。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::FactSet;

/// 舒适度采集记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComfortReading {
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub comfort_index: f64,
    pub comfort_grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl ComfortReading {
    /// 转换为事实集，字段名使用 camelCase；comment 为空时不写入
    pub fn to_facts(&self) -> FactSet {
        let mut facts = FactSet::new()
            .with("location", self.location.clone())
            .with("temperature", self.temperature)
            .with("humidity", self.humidity)
            .with("windSpeed", self.wind_speed)
            .with("comfortIndex", self.comfort_index)
            .with("comfortGrade", self.comfort_grade.clone())
            .with("capturedAt", self.captured_at.to_rfc3339());

        if let Some(comment) = &self.comment {
            facts.insert("comment", comment.clone());
        }
        facts
    }
}
