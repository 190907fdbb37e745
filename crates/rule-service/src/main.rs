//! 规则评估服务
//!
//! 启动 REST API 与批处理调度器。

use std::sync::Arc;

use rule_engine::{InMemoryRuleRepository, RuleLoader};
use ruleflow_service::{routes, state::AppState};
use ruleflow_shared::{config::AppConfig, observability};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：从 config/{service_name}.toml 加载，包含可观测性配置
    // 生产环境加载失败直接退出，其他环境退回默认配置
    let config = AppConfig::load_or_fallback("ruleflow-service")?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting ruleflow-service on {}", config.server_addr());

    // 规则定义在启动时一次性载入内存仓储
    let repository = InMemoryRuleRepository::new();
    match &config.rules.definitions_path {
        Some(path) => {
            let summary = RuleLoader::load_file(&repository, path)?;
            info!(
                path = %path,
                groups = summary.groups,
                rules = summary.rules,
                "Rule definitions loaded"
            );
        }
        None if config.is_production() => {
            anyhow::bail!("rules.definitions_path must be set in production environment");
        }
        None => warn!("No rule definitions configured, starting with an empty repository"),
    }

    let state = AppState::from_config(&config, Arc::new(repository));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = if config.scheduler.enabled {
        Some(state.scheduler(&config).spawn(shutdown_rx))
    } else {
        info!("Batch scheduler disabled");
        None
    };

    let app = routes::app(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // HTTP 停止后再通知调度器退出，正在执行的周期会先完成
    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            warn!("Batch scheduler task ended abnormally: {}", e);
        }
    }

    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// 收到 SIGTERM 或 Ctrl+C 后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("注册 Ctrl+C 处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("注册 SIGTERM 处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
