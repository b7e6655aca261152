//! Shift and time-clock fact repository

use super::{RepoError, RepoResult};
use shared::models::{SegmentHours, Shift};
use sqlx::SqliteConnection;

pub async fn insert_shift(
    conn: &mut SqliteConnection,
    id: i64,
    employee_id: i64,
    role_id: i64,
    start_at: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO shift (id, employee_id, role_id, start_at) VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(employee_id)
    .bind(role_id)
    .bind(start_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_shift(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Shift>> {
    let shift = sqlx::query_as::<_, Shift>(
        "SELECT id, employee_id, role_id, start_at, end_at, net_sales_cents FROM shift WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(shift)
}

/// Close a shift, recording end time and reported net sales
pub async fn close_shift(
    conn: &mut SqliteConnection,
    id: i64,
    end_at: i64,
    net_sales_cents: Option<i64>,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE shift SET end_at = ?, net_sales_cents = ? WHERE id = ? AND end_at IS NULL",
    )
    .bind(end_at)
    .bind(net_sales_cents)
    .bind(id)
    .execute(conn)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Shift {id} not found or already closed"
        )));
    }
    Ok(())
}

/// Employees of `role_id` whose shifts overlap [start, end], excluding
/// `exclude_employee_id` — the receiver set for a tip-out rule
pub async fn employees_on_shift_by_role(
    conn: &mut SqliteConnection,
    role_id: i64,
    start_millis: i64,
    end_millis: i64,
    exclude_employee_id: i64,
) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT employee_id FROM shift \
         WHERE role_id = ? AND employee_id != ? \
         AND start_at <= ? AND (end_at IS NULL OR end_at >= ?) \
         ORDER BY employee_id",
    )
    .bind(role_id)
    .bind(exclude_employee_id)
    .bind(end_millis)
    .bind(start_millis)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

pub async fn upsert_segment_hours(
    conn: &mut SqliteConnection,
    segment_id: i64,
    employee_id: i64,
    hours: f64,
) -> RepoResult<()> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(RepoError::Validation(format!(
            "hours must be a non-negative finite number, got {hours}"
        )));
    }
    sqlx::query(
        "INSERT INTO segment_hours (segment_id, employee_id, hours) VALUES (?, ?, ?) \
         ON CONFLICT(segment_id, employee_id) DO UPDATE SET hours = excluded.hours",
    )
    .bind(segment_id)
    .bind(employee_id)
    .bind(hours)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn hours_for_segment(
    conn: &mut SqliteConnection,
    segment_id: i64,
) -> RepoResult<Vec<SegmentHours>> {
    let hours = sqlx::query_as::<_, SegmentHours>(
        "SELECT segment_id, employee_id, hours FROM segment_hours WHERE segment_id = ?",
    )
    .bind(segment_id)
    .fetch_all(conn)
    .await?;
    Ok(hours)
}
