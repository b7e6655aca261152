//! Tip adjustment repository

use super::{RepoError, RepoResult};
use shared::models::TipAdjustment;
use sqlx::{SqliteConnection, SqlitePool};

const SELECT: &str = "SELECT id, created_by_employee_id, reason, adjustment_type, context_json, created_at, auto_recalc_ran FROM tip_adjustment";

pub async fn insert(conn: &mut SqliteConnection, adjustment: &TipAdjustment) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO tip_adjustment (id, created_by_employee_id, reason, adjustment_type, context_json, created_at, auto_recalc_ran) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(adjustment.id)
    .bind(adjustment.created_by_employee_id)
    .bind(&adjustment.reason)
    .bind(adjustment.adjustment_type)
    .bind(&adjustment.context_json)
    .bind(adjustment.created_at)
    .bind(adjustment.auto_recalc_ran)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<TipAdjustment> {
    sqlx::query_as::<_, TipAdjustment>(&format!("{SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Adjustment {id} not found")))
}

pub async fn find_all(pool: &SqlitePool, limit: i32, offset: i32) -> RepoResult<Vec<TipAdjustment>> {
    let adjustments = sqlx::query_as::<_, TipAdjustment>(&format!(
        "{SELECT} ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(adjustments)
}
