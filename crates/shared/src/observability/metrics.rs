//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("rule_evaluations_total", "Total number of rule evaluations");
    metrics::describe_histogram!(
        "rule_evaluation_duration_seconds",
        "Rule evaluation duration in seconds"
    );

    metrics::describe_counter!("action_dispatches_total", "Total number of action dispatches");
    metrics::describe_histogram!(
        "action_dispatch_duration_seconds",
        "Action dispatch duration in seconds"
    );

    metrics::describe_counter!("batch_cycles_total", "Total number of batch cycles");
    metrics::describe_counter!(
        "batch_records_total",
        "Total number of buffered records processed by batch cycles"
    );
    metrics::describe_histogram!(
        "batch_cycle_duration_seconds",
        "Batch cycle duration in seconds"
    );
    metrics::describe_gauge!("batch_last_results", "Result count of the latest batch cycle");

    metrics::describe_gauge!("ingest_buffer_depth", "Records waiting in the ingest buffer");
    metrics::describe_counter!(
        "ingest_rejected_total",
        "Records rejected because the ingest buffer was full"
    );

    metrics::describe_gauge!(
        "worker_last_run_timestamp",
        "Unix timestamp of the last worker run"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录单条规则评估
#[inline]
pub fn record_rule_evaluation(matched: bool, duration_secs: f64) {
    let matched = if matched { "true" } else { "false" };
    metrics::counter!("rule_evaluations_total", "matched" => matched).increment(1);
    metrics::histogram!("rule_evaluation_duration_seconds", "matched" => matched)
        .record(duration_secs);
}

/// 记录一次动作分发
#[inline]
pub fn record_action_dispatch(action_type: &str, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "failed" };
    metrics::counter!(
        "action_dispatches_total",
        "action_type" => action_type.to_string(),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "action_dispatch_duration_seconds",
        "action_type" => action_type.to_string()
    )
    .record(duration_secs);
}

/// 记录一个批处理周期
#[inline]
pub fn record_batch_cycle(records: usize, results: usize, duration_secs: f64) {
    metrics::counter!("batch_cycles_total").increment(1);
    metrics::counter!("batch_records_total").increment(records as u64);
    metrics::gauge!("batch_last_results").set(results as f64);
    metrics::histogram!("batch_cycle_duration_seconds").record(duration_secs);
}

/// 更新采集缓冲区积压深度
#[inline]
pub fn set_ingest_buffer_depth(depth: usize) {
    metrics::gauge!("ingest_buffer_depth").set(depth as f64);
}

/// 记录因缓冲区已满被拒绝的记录
#[inline]
pub fn record_ingest_rejected() {
    metrics::counter!("ingest_rejected_total").increment(1);
}

/// 记录 Worker 最近一次运行时间，供告警判断 Worker 是否存活
#[inline]
pub fn set_worker_last_run(worker: &str) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    metrics::gauge!("worker_last_run_timestamp", "worker" => worker.to_string()).set(now);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 即使没有初始化 recorder，这些函数也不应该 panic
        record_http_request("GET", "/api/v1/results/latest", 200, 0.1);
        record_rule_evaluation(true, 0.01);
        record_rule_evaluation(false, 0.02);
        record_action_dispatch("EMAIL", true, 0.05);
        record_action_dispatch("UNKNOWN", false, 0.0);
        record_batch_cycle(2, 3, 0.2);
        set_ingest_buffer_depth(10);
        record_ingest_rejected();
        set_worker_last_run("batch_scheduler");
    }

    #[test]
    fn test_handle_absent_before_init() {
        // 单元测试中从不安装 recorder
        assert!(get_handle().is_none());
    }
}
