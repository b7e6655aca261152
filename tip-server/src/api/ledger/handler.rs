//! Ledger API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::utils::time;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};
use shared::models::{EntryType, LedgerEntry, PayoutRequest};
use shared::util::now_millis;

/// Query params for the balance endpoint
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Unix millis; defaults to now
    pub as_of: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub employee_id: i64,
    pub as_of: i64,
    pub balance_cents: i64,
}

/// GET /api/ledger/:employee_id/balance - 余额查询
pub async fn balance(
    State(state): State<ServerState>,
    Path(employee_id): Path<i64>,
    Query(query): Query<BalanceQuery>,
) -> AppResult<Json<BalanceResponse>> {
    let as_of = query.as_of.unwrap_or_else(now_millis);
    let balance_cents = state
        .ledger
        .balance_as_of(employee_id, Some(as_of))
        .await
        .map_err(AppError::from)?;
    Ok(Json(BalanceResponse {
        employee_id,
        as_of,
        balance_cents,
    }))
}

/// Query params for the entries endpoint
#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub entry_type: Option<EntryType>,
}

/// GET /api/ledger/:employee_id/entries - 审计流水视图
pub async fn entries(
    State(state): State<ServerState>,
    Path(employee_id): Path<i64>,
    Query(query): Query<EntriesQuery>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let tz = state.config.timezone;
    let start = match &query.start_date {
        Some(d) => time::day_start_millis(time::parse_date(d)?, tz),
        None => 0,
    };
    let end = match &query.end_date {
        Some(d) => time::day_end_millis(time::parse_date(d)?, tz),
        None => now_millis() + 1,
    };

    let entries = state
        .ledger
        .entries(employee_id, start, end, query.entry_type)
        .await
        .map_err(AppError::from)?;
    Ok(Json(entries))
}

/// POST /api/ledger/:employee_id/payouts - 记录现金支出
pub async fn record_payout(
    State(state): State<ServerState>,
    Path(employee_id): Path<i64>,
    Json(payload): Json<PayoutRequest>,
) -> AppResult<Json<LedgerEntry>> {
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;

    let entry = state
        .ledger
        .record_payout(employee_id, &payload)
        .await
        .map_err(AppError::from)?;
    Ok(Json(entry))
}
