//! Adjustment API Handlers
//!
//! Manager-only surface; the authorization layer in front of this
//! service gates access before requests arrive here.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{AdjustmentRequest, AdjustmentResult, TipAdjustment};

/// POST /api/adjustments - 应用一次回溯修正
pub async fn apply(
    State(state): State<ServerState>,
    Json(payload): Json<AdjustmentRequest>,
) -> AppResult<Json<AdjustmentResult>> {
    validate_required_text(&payload.reason, "reason", MAX_NOTE_LEN)?;

    let result = state
        .adjustments
        .apply(&payload)
        .await
        .map_err(AppError::from)?;
    Ok(Json(result))
}

/// Query params for listing adjustments
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
}

fn default_limit() -> i32 {
    50
}

/// GET /api/adjustments - 修正历史 (审计)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<TipAdjustment>>> {
    let adjustments = state
        .adjustments
        .find_all(query.limit, query.offset)
        .await
        .map_err(AppError::from)?;
    Ok(Json(adjustments))
}

/// GET /api/adjustments/:id - 单条修正记录
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TipAdjustment>> {
    let adjustment = state
        .adjustments
        .find_by_id(id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(adjustment))
}
