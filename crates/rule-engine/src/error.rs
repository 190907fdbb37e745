//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("输入无效: 规则 {rule_id} 缺少必需的事实字段 {missing:?}")]
    InvalidInput { rule_id: i64, missing: Vec<String> },

    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("记录已存在: {entity} {field}={value}")]
    AlreadyExists {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("采集缓冲区已满: 容量 {capacity}")]
    BufferFull { capacity: usize },

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl RuleError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::BufferFull { .. } => "BUFFER_FULL",
            Self::Json(_) => "JSON_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
