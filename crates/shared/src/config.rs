//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::observability::ObservabilityConfig;

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 批处理调度配置
///
/// 调度器每个周期排空采集缓冲区，并以固定的合成触发事件评估每条记录。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// 调度周期（秒）
    pub interval_secs: u64,
    /// 批处理使用的触发事件类型
    pub event_type: String,
    /// 批处理使用的触发事件参数
    pub event_params: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            event_type: "AI_DATA_RECEIVED".to_string(),
            event_params: "comfort".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        // interval 为 0 时 tokio 会 panic，这里至少保留 1 秒
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// 采集缓冲区配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// 缓冲区容量上限，0 表示不限制
    pub capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

impl IngestConfig {
    pub fn capacity(&self) -> Option<usize> {
        (self.capacity > 0).then_some(self.capacity)
    }
}

/// 动作分发配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// 单个处理器的执行超时（毫秒），0 表示不限制
    pub handler_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            handler_timeout_ms: 30_000,
        }
    }
}

impl DispatchConfig {
    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_ms > 0).then(|| Duration::from_millis(self.handler_timeout_ms))
    }
}

/// 规则定义来源
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RulesConfig {
    /// 启动时加载的规则定义 JSON 文件
    pub definitions_path: Option<String>,
}

/// 通知配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub from_address: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@ruleflow.local".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub ingest: IngestConfig,
    pub dispatch: DispatchConfig,
    pub rules: RulesConfig,
    pub notification: NotificationConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RULEFLOW_ 前缀，`__` 分隔层级，如 RULEFLOW_SCHEDULER__INTERVAL_SECS）
    /// 5. 服务特定端口环境变量（如 RULEFLOW_SERVICE_PORT）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = Self::current_environment();

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", service_name)))
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("RULEFLOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        if let Some(port) = Self::service_port_from_env(service_name) {
            config.server.port = port;
        }

        Ok(config)
    }

    /// 从环境变量获取服务特定端口
    ///
    /// 将 "ruleflow-service" 转换为 "RULEFLOW_SERVICE_PORT"
    fn service_port_from_env(service_name: &str) -> Option<u16> {
        std::env::var(Self::port_env_var(service_name))
            .ok()
            .and_then(|v| v.parse().ok())
    }

    fn port_env_var(service_name: &str) -> String {
        format!("{}_PORT", service_name.to_uppercase().replace('-', "_"))
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION
    }

    /// 加载配置，失败时退回默认配置
    ///
    /// 生产环境（RULEFLOW_ENV=production）加载失败直接返回错误，不使用默认值。
    pub fn load_or_fallback(service_name: &str) -> Result<Self, ConfigError> {
        let env = Self::current_environment();
        Self::resolve(Self::load(service_name), service_name, &env)
    }

    /// 默认配置，保留服务名与运行环境
    pub fn fallback(service_name: &str, environment: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            environment: environment.to_string(),
            ..Default::default()
        }
    }

    fn resolve(
        loaded: Result<Self, ConfigError>,
        service_name: &str,
        environment: &str,
    ) -> Result<Self, ConfigError> {
        match loaded {
            Ok(config) => Ok(config),
            Err(e) if environment == PRODUCTION => Err(e),
            Err(e) => {
                // 此时日志尚未初始化
                eprintln!("Failed to load config, using defaults: {}", e);
                Ok(Self::fallback(service_name, environment))
            }
        }
    }

    fn current_environment() -> String {
        std::env::var("RULEFLOW_ENV").unwrap_or_else(|_| "development".to_string())
    }
}

const PRODUCTION: &str = "production";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scheduler.interval_secs, 60);
        assert_eq!(config.scheduler.event_type, "AI_DATA_RECEIVED");
        assert_eq!(config.ingest.capacity(), Some(10_000));
        assert_eq!(
            config.dispatch.handler_timeout(),
            Some(Duration::from_secs(30))
        );
        assert!(config.rules.definitions_path.is_none());
    }

    #[test]
    fn test_server_addr() {
        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            ..Default::default()
        };
        assert_eq!(config.server_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_zero_means_unbounded() {
        let ingest = IngestConfig { capacity: 0 };
        assert_eq!(ingest.capacity(), None);

        let dispatch = DispatchConfig {
            handler_timeout_ms: 0,
        };
        assert_eq!(dispatch.handler_timeout(), None);
    }

    #[test]
    fn test_scheduler_interval_never_zero() {
        let scheduler = SchedulerConfig {
            interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(scheduler.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_port_env_var_name() {
        assert_eq!(
            AppConfig::port_env_var("ruleflow-service"),
            "RULEFLOW_SERVICE_PORT"
        );
    }

    #[test]
    fn test_fallback_keeps_identity() {
        let loaded = Err(ConfigError::Message("invalid type for scheduler.interval_secs".into()));
        let config = AppConfig::resolve(loaded, "ruleflow-service", "staging").unwrap();

        assert_eq!(config.service_name, "ruleflow-service");
        assert_eq!(config.environment, "staging");
        assert!(!config.is_production());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_failure_in_production_is_fatal() {
        let loaded = Err(ConfigError::Message("malformed default.toml".into()));
        let err = AppConfig::resolve(loaded, "ruleflow-service", "production").unwrap_err();
        assert!(err.to_string().contains("malformed default.toml"));
    }

    #[test]
    fn test_resolve_passes_loaded_config_through() {
        let loaded = Ok(AppConfig::fallback("ruleflow-service", "production"));
        let config = AppConfig::resolve(loaded, "other", "production").unwrap();
        assert_eq!(config.service_name, "ruleflow-service");
        assert!(config.is_production());
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        // 配置目录不存在时所有文件源都是可选的
        // SAFETY: 该变量只在本测试中读取
        unsafe {
            std::env::set_var("CONFIG_DIR", "/nonexistent-ruleflow-config");
        }
        let config = AppConfig::load("ruleflow-test-loader").unwrap();
        assert_eq!(config.service_name, "ruleflow-test-loader");
        assert_eq!(config.scheduler.interval_secs, 60);
        unsafe {
            std::env::remove_var("CONFIG_DIR");
        }
    }
}
