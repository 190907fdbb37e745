//! 请求与响应 DTO

use chrono::{DateTime, Utc};
use rule_engine::ingest::PublishedResults;
use rule_engine::{ComfortReading, FactSet, RuleEvaluationResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// API 统一响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "操作成功")
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

/// 舒适度数据推送请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[validate(length(min = 1, max = 100, message = "位置长度必须在1-100个字符之间"))]
    pub location: String,
    #[validate(range(min = -100.0, max = 100.0, message = "温度超出范围"))]
    pub temperature: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "湿度必须在0-100之间"))]
    pub humidity: f64,
    #[validate(range(min = 0.0, message = "风速不能为负数"))]
    pub wind_speed: f64,
    pub comfort_index: f64,
    #[validate(length(min = 1, max = 50, message = "舒适度等级不能为空"))]
    pub comfort_grade: String,
    #[validate(length(max = 500, message = "备注不能超过500个字符"))]
    pub comment: Option<String>,
    /// 缺省时使用服务端接收时间
    pub captured_at: Option<DateTime<Utc>>,
}

impl From<IngestRequest> for ComfortReading {
    fn from(req: IngestRequest) -> Self {
        Self {
            location: req.location,
            temperature: req.temperature,
            humidity: req.humidity,
            wind_speed: req.wind_speed,
            comfort_index: req.comfort_index,
            comfort_grade: req.comfort_grade,
            comment: req.comment,
            captured_at: req.captured_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 推送受理响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestAccepted {
    /// 受理后缓冲区中等待处理的记录数
    pub pending: usize,
}

/// 手动评估请求
#[derive(Debug, Deserialize)]
pub struct EvaluateRuleRequest {
    #[serde(default)]
    pub facts: FactSet,
}

/// 触发评估请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    #[validate(length(min = 1, max = 100, message = "事件类型不能为空"))]
    pub event_type: String,
    #[serde(default)]
    pub event_params: String,
    #[serde(default)]
    pub facts: FactSet,
}

/// 最近一次批处理结果
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestResultsDto {
    /// 是否已有批处理周期完成
    pub available: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub results: Vec<RuleEvaluationResult>,
}

impl LatestResultsDto {
    pub fn from_published(published: Option<&PublishedResults>) -> Self {
        match published {
            Some(p) => Self {
                available: true,
                published_at: Some(p.published_at),
                results: p.results.clone(),
            },
            None => Self {
                available: false,
                published_at: None,
                results: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_ingest() -> serde_json::Value {
        json!({
            "location": "Seoul",
            "temperature": 31.5,
            "humidity": 70,
            "windSpeed": 2.1,
            "comfortIndex": 45,
            "comfortGrade": "POOR"
        })
    }

    #[test]
    fn test_ingest_request_validation() {
        let req: IngestRequest = serde_json::from_value(valid_ingest()).unwrap();
        assert!(req.validate().is_ok());

        let mut invalid = valid_ingest();
        invalid["humidity"] = json!(140);
        invalid["location"] = json!("");
        let req: IngestRequest = serde_json::from_value(invalid).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("humidity"));
        assert!(fields.contains_key("location"));
    }

    #[test]
    fn test_ingest_request_defaults_capture_time() {
        let req: IngestRequest = serde_json::from_value(valid_ingest()).unwrap();
        let before = Utc::now();
        let reading = ComfortReading::from(req);
        assert!(reading.captured_at >= before);
        assert_eq!(reading.comfort_grade, "POOR");
    }

    #[test]
    fn test_trigger_request_defaults() {
        let req: TriggerRequest =
            serde_json::from_value(json!({"eventType": "AI_DATA_RECEIVED"})).unwrap();
        assert!(req.event_params.is_empty());
        assert!(req.facts.is_empty());
        assert!(req.validate().is_ok());

        let req: TriggerRequest = serde_json::from_value(json!({"eventType": ""})).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_latest_results_unavailable() {
        let dto = LatestResultsDto::from_published(None);
        assert!(!dto.available);
        assert!(dto.results.is_empty());
    }
}
