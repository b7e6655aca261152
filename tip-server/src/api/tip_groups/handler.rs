//! Tip group API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};
use shared::models::{SegmentHistory, TipGroup, TipGroupAddMember, TipGroupCreate};

/// GET /api/tip-groups - 活跃小费池列表
pub async fn list_active(State(state): State<ServerState>) -> AppResult<Json<Vec<TipGroup>>> {
    let groups = state.groups.active_groups().await.map_err(AppError::from)?;
    Ok(Json(groups))
}

#[derive(Serialize)]
pub struct GroupCreatedResponse {
    pub group_id: i64,
}

/// POST /api/tip-groups - 手动开池
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TipGroupCreate>,
) -> AppResult<Json<GroupCreatedResponse>> {
    let group_id = state
        .groups
        .create_group(
            payload.template_id,
            payload.split_mode,
            payload.initial_member_employee_id,
        )
        .await
        .map_err(AppError::from)?;
    Ok(Json(GroupCreatedResponse { group_id }))
}

/// GET /api/tip-groups/:id/history - 分段历史 (审计/报表)
pub async fn history(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<SegmentHistory>>> {
    let history = state.groups.group_history(id).await.map_err(AppError::from)?;
    Ok(Json(history))
}

#[derive(Serialize)]
pub struct SegmentTransitionResponse {
    /// Segment opened by the transition; absent when the group closed
    pub segment_id: Option<i64>,
}

/// POST /api/tip-groups/:id/members - 加入小费池
pub async fn add_member(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TipGroupAddMember>,
) -> AppResult<Json<SegmentTransitionResponse>> {
    let segment_id = state
        .groups
        .add_member(id, payload.employee_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(SegmentTransitionResponse {
        segment_id: Some(segment_id),
    }))
}

/// DELETE /api/tip-groups/:id/members/:employee_id - 离开小费池
pub async fn remove_member(
    State(state): State<ServerState>,
    Path((id, employee_id)): Path<(i64, i64)>,
) -> AppResult<Json<SegmentTransitionResponse>> {
    let segment_id = state
        .groups
        .remove_member(id, employee_id)
        .await
        .map_err(AppError::from)?;
    Ok(Json(SegmentTransitionResponse { segment_id }))
}
