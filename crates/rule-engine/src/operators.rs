//! 条件操作符定义

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// 条件操作符
///
/// 规则条件只支持针对单个事实字段的扁平比较，不支持嵌套表达式。
/// 无法识别的操作符标签解析为 `Unknown`，评估结果恒为 false。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    // 文本相等
    Eq,
    Ne,

    // 数值比较
    Gt,
    Lt,
    Gte,
    Lte,
    Between,

    // 子串包含
    In,
    NotIn,

    // 简化的 SQL 模式匹配
    Like,
    NotLike,

    Unknown,
}

impl Operator {
    /// 全部已知操作符
    pub const ALL: [Operator; 11] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
        Self::In,
        Self::NotIn,
        Self::Like,
        Self::NotLike,
        Self::Between,
    ];

    /// 从操作符标签解析，大小写不敏感，未知标签返回 `Unknown`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "EQ" => Self::Eq,
            "NE" | "NEQ" => Self::Ne,
            "GT" => Self::Gt,
            "LT" => Self::Lt,
            "GTE" | "GE" => Self::Gte,
            "LTE" | "LE" => Self::Lte,
            "IN" => Self::In,
            "NOT_IN" => Self::NotIn,
            "LIKE" => Self::Like,
            "NOT_LIKE" => Self::NotLike,
            "BETWEEN" => Self::Between,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Gt => "GT",
            Self::Lt => "LT",
            Self::Gte => "GTE",
            Self::Lte => "LTE",
            Self::Between => "BETWEEN",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::Like => "LIKE",
            Self::NotLike => "NOT_LIKE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for Operator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
