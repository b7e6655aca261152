//! Event ingestion handlers
//!
//! These endpoints consume facts from the order, time-clock and payment
//! collaborators. Settlement and shift-close are ledger-critical: their
//! errors propagate so the enclosing business operation fails visibly.
//! Clock-in is the one deliberate exception — pooling assignment is
//! best-effort and reported, never blocking.

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::db::repository::shift as shift_repo;
use crate::utils::{AppError, AppResult};
use shared::models::{
    ClockInEvent, ClockInOutcome, LedgerEntry, OrderSettlement, SegmentHoursEvent, ShiftCloseEvent,
};

/// POST /api/events/settlement - 订单结算
pub async fn settlement(
    State(state): State<ServerState>,
    Json(payload): Json<OrderSettlement>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let entries = state
        .resolver
        .settle_order(&payload)
        .await
        .map_err(AppError::from)?;
    Ok(Json(entries))
}

/// POST /api/events/clock-in - 打卡上班 (含尽力而为的池分配)
pub async fn clock_in(
    State(state): State<ServerState>,
    Json(payload): Json<ClockInEvent>,
) -> AppResult<Json<ClockInOutcome>> {
    let outcome = state
        .binder
        .clock_in(&payload)
        .await
        .map_err(AppError::from)?;
    Ok(Json(outcome))
}

/// POST /api/events/shift-close - 交班 (结算小费分出)
pub async fn shift_close(
    State(state): State<ServerState>,
    Json(payload): Json<ShiftCloseEvent>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let entries = state
        .tip_outs
        .close_shift(&payload)
        .await
        .map_err(AppError::from)?;
    Ok(Json(entries))
}

/// POST /api/events/segment-hours - 时钟工时事实 (hours_weighted 分摊)
pub async fn segment_hours(
    State(state): State<ServerState>,
    Json(payload): Json<SegmentHoursEvent>,
) -> AppResult<Json<usize>> {
    let mut tx = state.pool.begin().await.map_err(|e| AppError::database(e.to_string()))?;
    for entry in &payload.entries {
        shift_repo::upsert_segment_hours(&mut tx, payload.segment_id, entry.employee_id, entry.hours)
            .await?;
    }
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(payload.entries.len()))
}
