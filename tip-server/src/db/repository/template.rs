//! Tip group template repository

use super::{RepoError, RepoResult};
use shared::models::{TemplateCreate, TemplateUpdate, TipGroupTemplate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, name, allowed_role_ids, default_split_mode, active, created_at FROM tip_group_template";

pub async fn create(pool: &SqlitePool, data: TemplateCreate) -> RepoResult<TipGroupTemplate> {
    let id = snowflake_id();
    let now = now_millis();
    let allowed = serde_json::to_string(&data.allowed_role_ids)
        .map_err(|e| RepoError::Validation(format!("allowed_role_ids: {e}")))?;

    sqlx::query(
        "INSERT INTO tip_group_template (id, name, allowed_role_ids, default_split_mode, active, created_at) \
         VALUES (?, ?, ?, ?, 1, ?)",
    )
    .bind(id)
    .bind(&data.name)
    .bind(allowed)
    .bind(data.default_split_mode)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id_pool(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create template".into()))
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: TemplateUpdate,
) -> RepoResult<TipGroupTemplate> {
    let allowed = match &data.allowed_role_ids {
        Some(ids) => Some(
            serde_json::to_string(ids)
                .map_err(|e| RepoError::Validation(format!("allowed_role_ids: {e}")))?,
        ),
        None => None,
    };

    let rows = sqlx::query(
        "UPDATE tip_group_template SET \
         name = COALESCE(?, name), \
         allowed_role_ids = COALESCE(?, allowed_role_ids), \
         default_split_mode = COALESCE(?, default_split_mode), \
         active = COALESCE(?, active) \
         WHERE id = ?",
    )
    .bind(data.name)
    .bind(allowed)
    .bind(data.default_split_mode)
    .bind(data.active)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Template {id} not found")));
    }
    find_by_id_pool(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Template {id} not found")))
}

pub async fn find_by_id_pool(
    pool: &SqlitePool,
    id: i64,
) -> RepoResult<Option<TipGroupTemplate>> {
    let template =
        sqlx::query_as::<_, TipGroupTemplate>(&format!("{SELECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(template)
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<TipGroupTemplate>> {
    let templates =
        sqlx::query_as::<_, TipGroupTemplate>(&format!("{SELECT} WHERE active = 1 ORDER BY name"))
            .fetch_all(pool)
            .await?;
    Ok(templates)
}
