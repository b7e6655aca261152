//! Tip group engine
//!
//! Membership history is modelled as an append-only sequence of
//! segments. A membership change never edits a segment: it closes the
//! open one and opens a successor with the new composition. Credits
//! resolve the segment covering their instant, so late-arriving
//! settlements and historical replays see exactly the membership that
//! was in force.

use super::error::{TipError, TipResult};
use super::ledger::append_tx;
use super::money::{allocate, equal_weights, weight};
use crate::db::repository::{employee as employee_repo, shift as shift_repo, tip_group as group_repo};
use rust_decimal::prelude::*;
use shared::models::{
    EntryType, LedgerEntry, MemberShare, NewLedgerEntry, SegmentHistory, SegmentMember, SplitMode,
    TipGroupSegment, TipGroupStatus,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

/// Tip group engine
#[derive(Clone)]
pub struct GroupEngine {
    pool: SqlitePool,
}

impl GroupEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a new group with one member at 100% share
    pub async fn create_group(
        &self,
        template_id: Option<i64>,
        split_mode: SplitMode,
        initial_member: i64,
    ) -> TipResult<i64> {
        let mut tx = self.pool.begin().await?;
        let group_id =
            create_group_tx(&mut tx, template_id, split_mode, initial_member, now_millis()).await?;
        tx.commit().await?;
        tracing::info!(group_id, ?split_mode, initial_member, "Tip group created");
        Ok(group_id)
    }

    /// Add a member: closes the open segment and opens a successor
    /// containing the previous members plus the new one
    pub async fn add_member(&self, group_id: i64, employee_id: i64) -> TipResult<i64> {
        let mut tx = self.pool.begin().await?;
        let segment_id = add_member_tx(&mut tx, group_id, employee_id, now_millis()).await?;
        tx.commit().await?;
        tracing::info!(group_id, employee_id, segment_id, "Member added to tip group");
        Ok(segment_id)
    }

    /// Remove a member; the last member leaving closes the group
    pub async fn remove_member(&self, group_id: i64, employee_id: i64) -> TipResult<Option<i64>> {
        let mut tx = self.pool.begin().await?;
        let segment_id = remove_member_tx(&mut tx, group_id, employee_id, now_millis()).await?;
        tx.commit().await?;
        match segment_id {
            Some(id) => {
                tracing::info!(group_id, employee_id, segment_id = id, "Member left tip group")
            }
            None => tracing::info!(group_id, employee_id, "Last member left, tip group closed"),
        }
        Ok(segment_id)
    }

    /// Split a tip across the segment in force at `at` and append one
    /// GROUP_SHARE entry per member
    pub async fn credit_group(
        &self,
        group_id: i64,
        amount_cents: i64,
        reference_order_id: Option<i64>,
        at: i64,
    ) -> TipResult<Vec<LedgerEntry>> {
        let mut tx = self.pool.begin().await?;
        let entries =
            credit_group_tx(&mut tx, group_id, amount_cents, reference_order_id, at).await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// Full segment history of a group with per-member display shares
    pub async fn group_history(&self, group_id: i64) -> TipResult<Vec<SegmentHistory>> {
        let mut conn = self.pool.acquire().await?;
        group_repo::find_group(&mut conn, group_id)
            .await?
            .ok_or(TipError::GroupNotFound(group_id))?;

        let segments = group_repo::segments_of_group(&mut conn, group_id).await?;
        let mut history = Vec::with_capacity(segments.len());
        for segment in segments {
            let members = group_repo::members_of_segment(&mut conn, segment.id).await?;
            let weights = segment_weights(&mut conn, &segment, &members).await?;
            let total: Decimal = weights.iter().sum();
            let shares = members
                .iter()
                .zip(&weights)
                .map(|(m, w)| MemberShare {
                    employee_id: m.employee_id,
                    weight: m.weight,
                    share: if total > Decimal::ZERO {
                        (w / total).to_f64().unwrap_or(0.0)
                    } else {
                        0.0
                    },
                })
                .collect();
            history.push(SegmentHistory {
                id: segment.id,
                group_id,
                start_at: segment.start_at,
                end_at: segment.end_at,
                split_mode: segment.split_mode,
                members: shares,
            });
        }
        Ok(history)
    }

    /// Active groups overview
    pub async fn active_groups(&self) -> TipResult<Vec<shared::models::TipGroup>> {
        Ok(group_repo::find_active_groups(&self.pool).await?)
    }

    /// Close active groups whose open segment has been idle since before
    /// `cutoff`. Idempotent; runs outside the correctness-critical path.
    pub async fn expire_idle_groups(&self, cutoff: i64) -> TipResult<usize> {
        let ids = group_repo::find_idle_group_ids(&self.pool, cutoff).await?;
        let mut expired = 0;
        for group_id in ids {
            let mut tx = self.pool.begin().await?;
            match expire_group_tx(&mut tx, group_id, now_millis()).await {
                Ok(()) => {
                    tx.commit().await?;
                    expired += 1;
                    tracing::info!(group_id, "Idle tip group expired");
                }
                Err(TipError::SegmentLockConflict(_)) | Err(TipError::GroupClosed(_)) => {
                    // Someone beat the sweep to it; nothing to do
                }
                Err(e) => return Err(e),
            }
        }
        Ok(expired)
    }
}

// ── Transaction-composable core ─────────────────────────────────────

pub(crate) async fn create_group_tx(
    conn: &mut SqliteConnection,
    template_id: Option<i64>,
    split_mode: SplitMode,
    initial_member: i64,
    now: i64,
) -> TipResult<i64> {
    require_employee(conn, initial_member).await?;
    if let Some(existing) = group_repo::find_active_membership(conn, initial_member).await? {
        return Err(TipError::AlreadyInGroup {
            employee_id: initial_member,
            group_id: existing,
        });
    }

    let group_id = snowflake_id();
    group_repo::insert_group(conn, group_id, template_id, now).await?;

    let segment_id = snowflake_id();
    group_repo::insert_segment(conn, segment_id, group_id, now, split_mode).await?;

    let w = member_weight(conn, split_mode, initial_member).await?;
    group_repo::insert_member(conn, segment_id, initial_member, 0, w).await?;
    Ok(group_id)
}

pub(crate) async fn add_member_tx(
    conn: &mut SqliteConnection,
    group_id: i64,
    employee_id: i64,
    now: i64,
) -> TipResult<i64> {
    let group = group_repo::find_group(conn, group_id)
        .await?
        .ok_or(TipError::GroupNotFound(group_id))?;
    if group.status == TipGroupStatus::Closed {
        return Err(TipError::GroupClosed(group_id));
    }
    require_employee(conn, employee_id).await?;

    // Single-group invariant: active membership of *any* group blocks
    if let Some(existing) = group_repo::find_active_membership(conn, employee_id).await? {
        return Err(TipError::AlreadyInGroup {
            employee_id,
            group_id: existing,
        });
    }

    let open = group_repo::open_segment(conn, group_id)
        .await?
        .ok_or(TipError::SegmentLockConflict(group_id))?;
    let members = group_repo::members_of_segment(conn, open.id).await?;

    if group_repo::close_open_segment(conn, group_id, open.id, now).await? == 0 {
        return Err(TipError::SegmentLockConflict(group_id));
    }

    let segment_id = snowflake_id();
    group_repo::insert_segment(conn, segment_id, group_id, now, open.split_mode).await?;

    // Carry previous members in join order, then append the newcomer
    for m in &members {
        group_repo::insert_member(conn, segment_id, m.employee_id, m.position, m.weight).await?;
    }
    let next_position = members.iter().map(|m| m.position).max().unwrap_or(-1) + 1;
    let w = member_weight(conn, open.split_mode, employee_id).await?;
    group_repo::insert_member(conn, segment_id, employee_id, next_position, w).await?;
    Ok(segment_id)
}

pub(crate) async fn remove_member_tx(
    conn: &mut SqliteConnection,
    group_id: i64,
    employee_id: i64,
    now: i64,
) -> TipResult<Option<i64>> {
    let group = group_repo::find_group(conn, group_id)
        .await?
        .ok_or(TipError::GroupNotFound(group_id))?;
    if group.status == TipGroupStatus::Closed {
        return Err(TipError::GroupClosed(group_id));
    }

    let open = group_repo::open_segment(conn, group_id)
        .await?
        .ok_or(TipError::SegmentLockConflict(group_id))?;
    let members = group_repo::members_of_segment(conn, open.id).await?;
    if !members.iter().any(|m| m.employee_id == employee_id) {
        return Err(TipError::NotAGroupMember {
            employee_id,
            group_id,
        });
    }

    if group_repo::close_open_segment(conn, group_id, open.id, now).await? == 0 {
        return Err(TipError::SegmentLockConflict(group_id));
    }

    let remaining: Vec<&SegmentMember> = members
        .iter()
        .filter(|m| m.employee_id != employee_id)
        .collect();
    if remaining.is_empty() {
        group_repo::close_group(conn, group_id, now).await?;
        return Ok(None);
    }

    let segment_id = snowflake_id();
    group_repo::insert_segment(conn, segment_id, group_id, now, open.split_mode).await?;
    for m in remaining {
        group_repo::insert_member(conn, segment_id, m.employee_id, m.position, m.weight).await?;
    }
    Ok(Some(segment_id))
}

pub(crate) async fn credit_group_tx(
    conn: &mut SqliteConnection,
    group_id: i64,
    amount_cents: i64,
    reference_order_id: Option<i64>,
    at: i64,
) -> TipResult<Vec<LedgerEntry>> {
    if amount_cents < 0 {
        return Err(TipError::InvalidAmount(format!(
            "group credit must be non-negative, got {amount_cents}"
        )));
    }
    group_repo::find_group(conn, group_id)
        .await?
        .ok_or(TipError::GroupNotFound(group_id))?;
    if amount_cents == 0 {
        return Ok(Vec::new());
    }

    let segment = group_repo::segment_at(conn, group_id, at)
        .await?
        .ok_or(TipError::NoSegmentForInstant { group_id, at })?;
    let members = group_repo::members_of_segment(conn, segment.id).await?;
    let weights = segment_weights(conn, &segment, &members).await?;
    let shares = allocate(amount_cents, &weights)?;

    group_repo::insert_credit(conn, snowflake_id(), group_id, reference_order_id, amount_cents, at)
        .await?;

    let now = now_millis();
    let mut entries = Vec::new();
    for (member, share) in members.iter().zip(shares) {
        if share == 0 {
            continue;
        }
        let key = match reference_order_id {
            Some(order_id) => format!("settle:{order_id}:grp{group_id}:{}", member.employee_id),
            None => format!("credit:{group_id}:{at}:{}", member.employee_id),
        };
        let mut new_entry =
            NewLedgerEntry::new(member.employee_id, share, EntryType::GroupShare, key)
                .with_group(group_id);
        if let Some(order_id) = reference_order_id {
            new_entry = new_entry.with_order(order_id);
        }
        let (entry, _) = append_tx(conn, new_entry, now).await?;
        entries.push(entry);
    }
    Ok(entries)
}

async fn expire_group_tx(conn: &mut SqliteConnection, group_id: i64, now: i64) -> TipResult<()> {
    let group = group_repo::find_group(conn, group_id)
        .await?
        .ok_or(TipError::GroupNotFound(group_id))?;
    if group.status == TipGroupStatus::Closed {
        return Err(TipError::GroupClosed(group_id));
    }
    let open = group_repo::open_segment(conn, group_id)
        .await?
        .ok_or(TipError::SegmentLockConflict(group_id))?;
    if group_repo::close_open_segment(conn, group_id, open.id, now).await? == 0 {
        return Err(TipError::SegmentLockConflict(group_id));
    }
    group_repo::close_group(conn, group_id, now).await?;
    Ok(())
}

/// Per-member split weights for one segment.
///
/// Equal → 1 each. Role-weighted → the weight snapshot taken when the
/// member joined. Hours-weighted → hour facts recorded for the segment,
/// falling back to an equal split when the time clock reported nothing.
pub(crate) async fn segment_weights(
    conn: &mut SqliteConnection,
    segment: &TipGroupSegment,
    members: &[SegmentMember],
) -> TipResult<Vec<Decimal>> {
    match segment.split_mode {
        SplitMode::Equal => Ok(equal_weights(members.len())),
        SplitMode::RoleWeighted => {
            let weights: Vec<Decimal> = members
                .iter()
                .map(|m| weight(m.weight))
                .collect::<TipResult<_>>()?;
            if weights.iter().sum::<Decimal>() <= Decimal::ZERO {
                return Ok(equal_weights(members.len()));
            }
            Ok(weights)
        }
        SplitMode::HoursWeighted => {
            let hours = shift_repo::hours_for_segment(conn, segment.id).await?;
            let weights: Vec<Decimal> = members
                .iter()
                .map(|m| {
                    let h = hours
                        .iter()
                        .find(|r| r.employee_id == m.employee_id)
                        .map(|r| r.hours)
                        .unwrap_or(0.0);
                    weight(h)
                })
                .collect::<TipResult<_>>()?;
            if weights.iter().sum::<Decimal>() <= Decimal::ZERO {
                return Ok(equal_weights(members.len()));
            }
            Ok(weights)
        }
    }
}

/// Weight snapshot for a joining member: role tip-weight under
/// role-weighted splits, 1.0 otherwise
async fn member_weight(
    conn: &mut SqliteConnection,
    split_mode: SplitMode,
    employee_id: i64,
) -> TipResult<f64> {
    if split_mode != SplitMode::RoleWeighted {
        return Ok(1.0);
    }
    let employee = employee_repo::find_employee(conn, employee_id)
        .await?
        .ok_or(TipError::EmployeeNotFound(employee_id))?;
    let role = employee_repo::find_role(conn, employee.role_id).await?;
    Ok(role.map(|r| r.tip_weight).unwrap_or(1.0))
}

async fn require_employee(conn: &mut SqliteConnection, employee_id: i64) -> TipResult<()> {
    employee_repo::find_employee(conn, employee_id)
        .await?
        .ok_or(TipError::EmployeeNotFound(employee_id))?;
    Ok(())
}
