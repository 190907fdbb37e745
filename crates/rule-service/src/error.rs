//! HTTP 边界错误类型
//!
//! 将规则引擎错误映射为 HTTP 状态码和统一的错误响应体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rule_engine::RuleError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Rule(e) => match e {
                RuleError::NotFound { .. } => StatusCode::NOT_FOUND,
                RuleError::InvalidInput { .. } | RuleError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                RuleError::AlreadyExists { .. } => StatusCode::CONFLICT,
                RuleError::BufferFull { .. } => StatusCode::SERVICE_UNAVAILABLE,
                RuleError::Json(_) | RuleError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Rule(e) => e.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "内部错误");
            "服务内部错误，请稍后重试".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(RuleError::not_found("Rule", 1)), StatusCode::NOT_FOUND),
            (
                ApiError::from(RuleError::InvalidInput {
                    rule_id: 1,
                    missing: vec!["temperature".to_string()],
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(RuleError::BufferFull { capacity: 10 }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ApiError::Validation("x".to_string()), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{}", err);
        }
    }

    #[test]
    fn test_error_code_passthrough() {
        let err = ApiError::from(RuleError::BufferFull { capacity: 10 });
        assert_eq!(err.error_code(), "BUFFER_FULL");
        assert_eq!(ApiError::Validation(String::new()).error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::from(RuleError::not_found("Rule", 9)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
