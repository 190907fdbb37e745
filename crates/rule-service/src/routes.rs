//! 路由配置模块

use axum::{
    Router, middleware,
    routing::{get, post},
};
use ruleflow_shared::observability::middleware as obs_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

/// 构建 /api/v1 下的业务路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 数据采集
        .route("/ingest", post(handlers::ingest))
        .route("/results/latest", get(handlers::latest_results))
        // 规则评估
        .route("/rules/{id}", get(handlers::get_rule))
        .route("/rules/{id}/evaluate", post(handlers::evaluate_rule))
        .route("/triggers/evaluate", post(handlers::evaluate_trigger))
}

/// 构建完整应用路由
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api_routes())
        .route("/health", get(handlers::health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .with_state(state)
}
