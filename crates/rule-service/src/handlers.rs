//! API 处理器

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rule_engine::{RuleDetails, RuleEvaluationResult, RuleRepository};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, EvaluateRuleRequest, IngestAccepted, IngestRequest, LatestResultsDto,
        TriggerRequest,
    },
    error::ApiError,
    state::AppState,
};

/// 推送舒适度数据，进入下一个批处理周期
///
/// POST /api/v1/ingest
pub async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IngestAccepted>>), ApiError> {
    req.validate()?;

    state.buffer.add(req.into())?;

    let accepted = IngestAccepted {
        pending: state.buffer.len(),
    };
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success_with_message(accepted, "已受理")),
    ))
}

/// 获取最近一次批处理结果
///
/// GET /api/v1/results/latest
pub async fn latest_results(State(state): State<AppState>) -> Json<ApiResponse<LatestResultsDto>> {
    let published = state.cache.get();
    Json(ApiResponse::success(LatestResultsDto::from_published(
        published.as_deref(),
    )))
}

/// 手动评估单条规则
///
/// POST /api/v1/rules/{id}/evaluate
pub async fn evaluate_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<EvaluateRuleRequest>,
) -> Result<Json<ApiResponse<RuleEvaluationResult>>, ApiError> {
    let result = state.orchestrator.evaluate_one(id, &req.facts).await?;

    info!(rule_id = id, success = result.success, "Rule evaluated manually");

    Ok(Json(ApiResponse::success(result)))
}

/// 按触发事件评估规则
///
/// POST /api/v1/triggers/evaluate
pub async fn evaluate_trigger(
    State(state): State<AppState>,
    Json(req): Json<TriggerRequest>,
) -> Result<Json<ApiResponse<Vec<RuleEvaluationResult>>>, ApiError> {
    req.validate()?;

    let results = state
        .orchestrator
        .evaluate_triggered(&req.event_type, &req.event_params, &req.facts)
        .await?;

    Ok(Json(ApiResponse::success(results)))
}

/// 获取规则详情
///
/// GET /api/v1/rules/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<RuleDetails>>, ApiError> {
    let details = state.repository().find_rule_details(id).await?;
    Ok(Json(ApiResponse::success(details)))
}

/// 存活探针
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ruleflow-service"
    }))
}
