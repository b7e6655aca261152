//! Tip group template API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::template;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{TemplateCreate, TemplateUpdate, TipGroupTemplate};

/// Query params for listing templates
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// When present, filters to templates this role may join (clock-in screen)
    pub role_id: Option<i64>,
}

/// GET /api/tip-templates - 模板列表 (可按角色过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<TipGroupTemplate>>> {
    let templates = match query.role_id {
        Some(role_id) => state
            .binder
            .eligible_templates(role_id)
            .await
            .map_err(AppError::from)?,
        None => template::find_active(&state.pool).await?,
    };
    Ok(Json(templates))
}

/// POST /api/tip-templates - 创建模板
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TemplateCreate>,
) -> AppResult<Json<TipGroupTemplate>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    let created = template::create(&state.pool, payload).await?;
    Ok(Json(created))
}

/// PUT /api/tip-templates/:id - 更新模板
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TemplateUpdate>,
) -> AppResult<Json<TipGroupTemplate>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    let updated = template::update(&state.pool, id, payload).await?;
    Ok(Json(updated))
}
