//! Adjustment & recalculation engine
//!
//! A manager correction snapshots the facts it changes, applies the
//! change, replays the affected historical region with the corrected
//! facts, diffs the replay against everything previously posted for
//! that region, and appends one CORRECTION entry per affected employee
//! for exactly the delta. The adjustment record, the fact mutation and
//! the corrections commit as one unit of work; any failure rolls the
//! whole unit back and surfaces as `AdjustmentFailed`.

use super::error::{TipError, TipResult};
use super::groups::segment_weights;
use super::ledger::append_tx;
use super::money::{allocate, weight, MAX_AMOUNT_CENTS};
use crate::db::repository::{
    adjustment as adjustment_repo, employee as employee_repo, ledger as ledger_repo,
    ownership as ownership_repo, shift as shift_repo, tip_group as group_repo,
};
use rust_decimal::Decimal;
use shared::models::{
    AdjustmentCommand, AdjustmentRequest, AdjustmentResult, EmployeeDelta, EntryType,
    NewLedgerEntry, OwnerWeight, OwnershipOwner, TipAdjustment, TipGroupSegment,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqliteConnection;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Adjustment & recalculation engine
#[derive(Clone)]
pub struct AdjustmentEngine {
    pool: SqlitePool,
}

impl AdjustmentEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply a manager correction atomically.
    ///
    /// State machine per adjustment: created → recalculated, inside one
    /// transaction. There is no externally visible failed state; a
    /// failure rolls back everything and the call errors.
    pub async fn apply(&self, req: &AdjustmentRequest) -> TipResult<AdjustmentResult> {
        if req.reason.trim().is_empty() {
            return Err(TipError::AdjustmentFailed("reason must not be empty".into()));
        }

        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        match apply_tx(&mut tx, req, now).await {
            Ok(result) => {
                tx.commit().await?;
                tracing::info!(
                    adjustment_id = result.adjustment.id,
                    adjustment_type = ?result.adjustment.adjustment_type,
                    created_by = req.created_by_employee_id,
                    corrections = result.corrections.len(),
                    "Adjustment applied"
                );
                Ok(result)
            }
            Err(e) => {
                // Dropping the transaction rolls everything back
                tracing::warn!(error = %e, "Adjustment rolled back");
                match e {
                    TipError::AdjustmentFailed(_) => Err(e),
                    other => Err(TipError::AdjustmentFailed(other.to_string())),
                }
            }
        }
    }

    pub async fn find_by_id(&self, id: i64) -> TipResult<TipAdjustment> {
        Ok(adjustment_repo::find_by_id(&self.pool, id).await?)
    }

    pub async fn find_all(&self, limit: i32, offset: i32) -> TipResult<Vec<TipAdjustment>> {
        Ok(adjustment_repo::find_all(&self.pool, limit, offset).await?)
    }
}

/// Pure diff: per-employee corrected minus previous, zero deltas
/// dropped, stable employee-id order
pub fn compute_delta(
    previous: &[(i64, i64)],
    corrected: &[(i64, i64)],
) -> Vec<EmployeeDelta> {
    let mut merged: BTreeMap<i64, i64> = BTreeMap::new();
    for (employee_id, amount) in corrected {
        *merged.entry(*employee_id).or_insert(0) += amount;
    }
    for (employee_id, amount) in previous {
        *merged.entry(*employee_id).or_insert(0) -= amount;
    }
    merged
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .map(|(employee_id, amount_cents)| EmployeeDelta {
            employee_id,
            amount_cents,
        })
        .collect()
}

async fn apply_tx(
    conn: &mut SqliteConnection,
    req: &AdjustmentRequest,
    now: i64,
) -> TipResult<AdjustmentResult> {
    let adjustment_id = snowflake_id();

    let (context, corrections, recalc_ran) = match &req.command {
        AdjustmentCommand::GroupMembership {
            group_id,
            segment_id,
            new_start_at,
            new_end_at,
        } => {
            // Lock the group row so replay cannot race live activity
            group_repo::touch_group(conn, *group_id).await?;
            let context =
                move_segment_boundary(conn, *group_id, *segment_id, *new_start_at, *new_end_at)
                    .await?;
            let corrections = replay_group(conn, *group_id, adjustment_id, now).await?;
            (context, corrections, true)
        }

        AdjustmentCommand::ClockFix {
            segment_id,
            employee_id,
            hours,
        } => {
            let segment = group_repo::find_segment(conn, *segment_id)
                .await?
                .ok_or(TipError::SegmentNotFound(*segment_id))?;
            group_repo::touch_group(conn, segment.group_id).await?;

            let old_hours = shift_repo::hours_for_segment(conn, *segment_id)
                .await?
                .into_iter()
                .find(|h| h.employee_id == *employee_id)
                .map(|h| h.hours);
            shift_repo::upsert_segment_hours(conn, *segment_id, *employee_id, *hours).await?;

            let context = serde_json::json!({
                "segment_id": segment_id,
                "employee_id": employee_id,
                "before": { "hours": old_hours },
                "after": { "hours": hours },
            })
            .to_string();
            let corrections = replay_group(conn, segment.group_id, adjustment_id, now).await?;
            (context, corrections, true)
        }

        AdjustmentCommand::OwnershipSplit { order_id, owners } => {
            let record = ownership_repo::find_record(conn, *order_id)
                .await?
                .ok_or(TipError::OrderNotSettled(*order_id))?;
            validate_owner_weights(owners)?;

            let old_owners = ownership_repo::owners_of_order(conn, *order_id).await?;
            let new_owners: Vec<OwnershipOwner> = owners
                .iter()
                .enumerate()
                .map(|(position, o)| OwnershipOwner {
                    order_id: *order_id,
                    employee_id: o.employee_id,
                    position: position as i64,
                    weight: o.weight,
                })
                .collect();
            ownership_repo::replace_owners(conn, *order_id, &new_owners).await?;

            let context = serde_json::json!({
                "order_id": order_id,
                "before": { "owners": old_owners },
                "after": { "owners": new_owners },
            })
            .to_string();
            let corrections = replay_order(conn, record.order_id, adjustment_id, now).await?;
            (context, corrections, true)
        }

        AdjustmentCommand::TipAmount {
            order_id,
            tip_amount_cents,
        } => {
            let record = ownership_repo::find_record(conn, *order_id)
                .await?
                .ok_or(TipError::OrderNotSettled(*order_id))?;
            if *tip_amount_cents < 0 || *tip_amount_cents > MAX_AMOUNT_CENTS {
                return Err(TipError::InvalidAmount(format!(
                    "corrected tip amount must be within [0, {MAX_AMOUNT_CENTS}], got {tip_amount_cents}"
                )));
            }
            ownership_repo::update_tip_amount(conn, *order_id, *tip_amount_cents).await?;

            let context = serde_json::json!({
                "order_id": order_id,
                "before": { "tip_amount_cents": record.tip_amount_cents },
                "after": { "tip_amount_cents": tip_amount_cents },
            })
            .to_string();
            let corrections = replay_order(conn, *order_id, adjustment_id, now).await?;
            (context, corrections, true)
        }

        AdjustmentCommand::ManualOverride { deltas } => {
            if deltas.is_empty() {
                return Err(TipError::AdjustmentFailed(
                    "manual override requires at least one delta".into(),
                ));
            }
            for delta in deltas {
                if delta.amount_cents == 0 {
                    return Err(TipError::AdjustmentFailed(format!(
                        "zero delta for employee {}",
                        delta.employee_id
                    )));
                }
                employee_repo::find_employee(conn, delta.employee_id)
                    .await?
                    .ok_or(TipError::EmployeeNotFound(delta.employee_id))?;
                append_tx(
                    conn,
                    NewLedgerEntry::new(
                        delta.employee_id,
                        delta.amount_cents,
                        EntryType::Correction,
                        format!("adjust:{adjustment_id}:{}", delta.employee_id),
                    )
                    .with_adjustment(adjustment_id),
                    now,
                )
                .await?;
            }
            let context = serde_json::json!({ "deltas": deltas }).to_string();
            (context, deltas.clone(), false)
        }
    };

    let adjustment = TipAdjustment {
        id: adjustment_id,
        created_by_employee_id: req.created_by_employee_id,
        reason: req.reason.clone(),
        adjustment_type: req.command.adjustment_type(),
        context_json: context,
        created_at: now,
        auto_recalc_ran: recalc_ran,
    };
    adjustment_repo::insert(conn, &adjustment).await?;

    Ok(AdjustmentResult {
        adjustment,
        corrections,
    })
}

/// Move one segment's boundary, shifting the adjacent segment's opposite
/// boundary with it so the group's history stays gap-free. Returns the
/// context snapshot.
async fn move_segment_boundary(
    conn: &mut SqliteConnection,
    group_id: i64,
    segment_id: i64,
    new_start_at: Option<i64>,
    new_end_at: Option<i64>,
) -> TipResult<String> {
    let segment = group_repo::find_segment(conn, segment_id)
        .await?
        .ok_or(TipError::SegmentNotFound(segment_id))?;
    if segment.group_id != group_id {
        return Err(TipError::SegmentNotFound(segment_id));
    }

    let new_start = new_start_at.unwrap_or(segment.start_at);
    let new_end = match new_end_at {
        Some(v) => Some(v),
        None => segment.end_at,
    };
    if let Some(end) = new_end
        && new_start >= end
    {
        return Err(TipError::AdjustmentFailed(format!(
            "segment start {new_start} must precede end {end}"
        )));
    }
    if new_end_at.is_some() && segment.end_at.is_none() {
        return Err(TipError::AdjustmentFailed(
            "cannot close the open segment via adjustment".into(),
        ));
    }

    let segments = group_repo::segments_of_group(conn, group_id).await?;

    // Shift the previous segment's end together with this start
    if new_start != segment.start_at {
        if let Some(prev) = segments
            .iter()
            .find(|s| s.end_at == Some(segment.start_at))
        {
            if new_start <= prev.start_at {
                return Err(TipError::AdjustmentFailed(format!(
                    "new start {new_start} would invert the preceding segment"
                )));
            }
            group_repo::update_segment_bounds(conn, prev.id, prev.start_at, Some(new_start))
                .await?;
        }
    }

    // Shift the following segment's start together with this end
    if let (Some(old_end), Some(end)) = (segment.end_at, new_end)
        && end != old_end
    {
        if let Some(next) = segments.iter().find(|s| s.start_at == old_end) {
            if let Some(next_end) = next.end_at
                && end >= next_end
            {
                return Err(TipError::AdjustmentFailed(format!(
                    "new end {end} would invert the following segment"
                )));
            }
            group_repo::update_segment_bounds(conn, next.id, end, next.end_at).await?;
        }
    }

    group_repo::update_segment_bounds(conn, segment_id, new_start, new_end).await?;

    Ok(serde_json::json!({
        "group_id": group_id,
        "segment_id": segment_id,
        "before": { "start_at": segment.start_at, "end_at": segment.end_at },
        "after": { "start_at": new_start, "end_at": new_end },
    })
    .to_string())
}

/// Replay every credit ever routed through the group against its
/// (corrected) segment history, diff per employee against everything
/// posted for the group, and append the correction deltas.
async fn replay_group(
    conn: &mut SqliteConnection,
    group_id: i64,
    adjustment_id: i64,
    now: i64,
) -> TipResult<Vec<EmployeeDelta>> {
    let credits = group_repo::credits_of_group(conn, group_id).await?;
    let mut corrected: BTreeMap<i64, i64> = BTreeMap::new();

    for credit in &credits {
        let segment = group_repo::segment_at(conn, group_id, credit.credited_at)
            .await?
            .ok_or_else(|| {
                TipError::AdjustmentFailed(format!(
                    "credit at {} is no longer covered by any segment",
                    credit.credited_at
                ))
            })?;
        accumulate_segment_shares(conn, &segment, credit.amount_cents, &mut corrected).await?;
    }

    let previous = ledger_repo::sum_by_employee_for_group(conn, group_id).await?;
    let corrected_vec: Vec<(i64, i64)> = corrected.into_iter().collect();
    let deltas = compute_delta(&previous, &corrected_vec);

    for delta in &deltas {
        append_tx(
            conn,
            NewLedgerEntry::new(
                delta.employee_id,
                delta.amount_cents,
                EntryType::Correction,
                format!("adjust:{adjustment_id}:{}", delta.employee_id),
            )
            .with_group(group_id)
            .with_adjustment(adjustment_id),
            now,
        )
        .await?;
    }
    Ok(deltas)
}

/// Replay one order's settlement against its (corrected) ownership
/// record, diff per employee against everything posted for the order,
/// and append the correction deltas. Group-credit replay facts for the
/// order are brought in line with the corrected routing.
async fn replay_order(
    conn: &mut SqliteConnection,
    order_id: i64,
    adjustment_id: i64,
    now: i64,
) -> TipResult<Vec<EmployeeDelta>> {
    let record = ownership_repo::find_record(conn, order_id)
        .await?
        .ok_or(TipError::OrderNotSettled(order_id))?;
    let owners = ownership_repo::owners_of_order(conn, order_id).await?;

    let weights: Vec<Decimal> = owners
        .iter()
        .map(|o| weight(o.weight))
        .collect::<TipResult<_>>()?;
    let shares = allocate(record.tip_amount_cents, &weights)?;

    let mut corrected: BTreeMap<i64, i64> = BTreeMap::new();
    let mut routed: BTreeMap<i64, i64> = BTreeMap::new();

    for (owner, share) in owners.iter().zip(shares) {
        if share == 0 {
            continue;
        }
        match group_repo::find_membership_at(conn, owner.employee_id, record.resolved_at).await? {
            Some(group_id) => {
                let segment = group_repo::segment_at(conn, group_id, record.resolved_at)
                    .await?
                    .ok_or(TipError::NoSegmentForInstant {
                        group_id,
                        at: record.resolved_at,
                    })?;
                accumulate_segment_shares(conn, &segment, share, &mut corrected).await?;
                *routed.entry(group_id).or_insert(0) += share;
            }
            None => {
                *corrected.entry(owner.employee_id).or_insert(0) += share;
            }
        }
    }

    // Keep group replay facts consistent with the corrected routing
    for (group_id, amount) in &routed {
        group_repo::insert_credit(
            conn,
            snowflake_id(),
            *group_id,
            Some(order_id),
            *amount,
            record.resolved_at,
        )
        .await?;
        group_repo::update_credit_amount(conn, *group_id, order_id, *amount).await?;
    }
    for group_id in ledger_repo::groups_for_order(conn, order_id).await? {
        if !routed.contains_key(&group_id) {
            group_repo::update_credit_amount(conn, group_id, order_id, 0).await?;
        }
    }

    let previous = ledger_repo::sum_by_employee_for_order(conn, order_id).await?;
    let corrected_vec: Vec<(i64, i64)> = corrected.into_iter().collect();
    let deltas = compute_delta(&previous, &corrected_vec);

    for delta in &deltas {
        append_tx(
            conn,
            NewLedgerEntry::new(
                delta.employee_id,
                delta.amount_cents,
                EntryType::Correction,
                format!("adjust:{adjustment_id}:{}", delta.employee_id),
            )
            .with_order(order_id)
            .with_adjustment(adjustment_id),
            now,
        )
        .await?;
    }
    Ok(deltas)
}

/// Split `amount` across a segment's members and add each share into the
/// running per-employee totals
async fn accumulate_segment_shares(
    conn: &mut SqliteConnection,
    segment: &TipGroupSegment,
    amount_cents: i64,
    totals: &mut BTreeMap<i64, i64>,
) -> TipResult<()> {
    let members = group_repo::members_of_segment(conn, segment.id).await?;
    let weights = segment_weights(conn, segment, &members).await?;
    let shares = allocate(amount_cents, &weights)?;
    for (member, share) in members.iter().zip(shares) {
        if share != 0 {
            *totals.entry(member.employee_id).or_insert(0) += share;
        }
    }
    Ok(())
}

fn validate_owner_weights(owners: &[OwnerWeight]) -> TipResult<()> {
    if owners.is_empty() {
        return Err(TipError::AdjustmentFailed(
            "ownership split requires at least one owner".into(),
        ));
    }
    let mut total = 0.0;
    for o in owners {
        if !o.weight.is_finite() || o.weight < 0.0 {
            return Err(TipError::AdjustmentFailed(format!(
                "invalid weight {} for employee {}",
                o.weight, o.employee_id
            )));
        }
        total += o.weight;
    }
    if total <= 0.0 {
        return Err(TipError::AdjustmentFailed(
            "owner weights must sum to a positive value".into(),
        ));
    }
    Ok(())
}
