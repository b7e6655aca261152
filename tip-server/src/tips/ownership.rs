//! Ownership resolver
//!
//! Attributes a settled order's tip to its owners and writes the
//! resulting ledger entries. The resolution is snapshotted per order at
//! settlement time (an OwnershipRecord), so later changes to ownership
//! settings never rewrite history; only the adjustment engine can
//! revise a record, and it does so with correction entries.

use super::error::{TipError, TipResult};
use super::groups::credit_group_tx;
use super::ledger::append_tx;
use super::money::{allocate, MAX_AMOUNT_CENTS};
use crate::db::repository::{ledger as ledger_repo, ownership as ownership_repo, tip_group as group_repo};
use rust_decimal::prelude::*;
use shared::models::{
    EntryType, LedgerEntry, NewLedgerEntry, OrderSettlement, OwnershipMode, OwnershipOwner,
    OwnershipRecord,
};
use shared::util::now_millis;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Ownership resolver and settlement entry point
#[derive(Clone)]
pub struct OwnershipResolver {
    pool: SqlitePool,
}

impl OwnershipResolver {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve ownership for a settled order and post all resulting
    /// ledger entries in one unit of work.
    ///
    /// Re-settling an already-settled order is a no-op that returns the
    /// entries previously posted for it.
    pub async fn settle_order(&self, settlement: &OrderSettlement) -> TipResult<Vec<LedgerEntry>> {
        validate_settlement(settlement)?;
        let settled_at = settlement.settled_at.unwrap_or_else(now_millis);

        let mut tx = self.pool.begin().await?;

        if ownership_repo::find_record(&mut tx, settlement.order_id)
            .await?
            .is_some()
        {
            // Retried settlement: history already holds the answer
            let entries = ledger_repo::find_by_order(&mut tx, settlement.order_id).await?;
            tx.commit().await?;
            tracing::debug!(order_id = settlement.order_id, "Order already settled, returning existing entries");
            return Ok(entries);
        }

        let (mode, owners) = resolve_owner_weights(settlement);

        let record = OwnershipRecord {
            order_id: settlement.order_id,
            mode,
            tip_amount_cents: settlement.tip_amount_cents,
            subtotal_cents: settlement.subtotal_cents,
            table_id: settlement.table_id,
            creator_employee_id: settlement.creator_employee_id,
            resolved_at: settled_at,
        };
        ownership_repo::insert_record(&mut tx, &record).await?;
        for (position, (employee_id, w)) in owners.iter().enumerate() {
            ownership_repo::insert_owner(
                &mut tx,
                &OwnershipOwner {
                    order_id: settlement.order_id,
                    employee_id: *employee_id,
                    position: position as i64,
                    weight: w.to_f64().unwrap_or(0.0),
                },
            )
            .await?;
        }

        let weights: Vec<Decimal> = owners.iter().map(|(_, w)| *w).collect();
        let shares = allocate(settlement.tip_amount_cents, &weights)?;

        // Owners pooled at settlement time route their share through the
        // group; everyone else is credited directly. Shares headed for the
        // same group are combined into one credit.
        let now = now_millis();
        let mut entries = Vec::new();
        let mut routed: BTreeMap<i64, i64> = BTreeMap::new();
        for ((employee_id, _), share) in owners.iter().zip(shares) {
            if share == 0 {
                continue;
            }
            match group_repo::find_membership_at(&mut tx, *employee_id, settled_at).await? {
                Some(group_id) => {
                    *routed.entry(group_id).or_insert(0) += share;
                }
                None => {
                    let (entry, _) = append_tx(
                        &mut tx,
                        NewLedgerEntry::new(
                            *employee_id,
                            share,
                            EntryType::DirectTip,
                            format!("settle:{}:{}", settlement.order_id, employee_id),
                        )
                        .with_order(settlement.order_id),
                        now,
                    )
                    .await?;
                    entries.push(entry);
                }
            }
        }
        for (group_id, amount) in routed {
            let group_entries =
                credit_group_tx(&mut tx, group_id, amount, Some(settlement.order_id), settled_at)
                    .await?;
            entries.extend(group_entries);
        }

        tx.commit().await?;
        tracing::info!(
            order_id = settlement.order_id,
            tip_amount_cents = settlement.tip_amount_cents,
            owners = owners.len(),
            entries = entries.len(),
            "Order settled"
        );
        Ok(entries)
    }

    /// The stored ownership record for an order, with its owners
    pub async fn record_of(
        &self,
        order_id: i64,
    ) -> TipResult<(OwnershipRecord, Vec<OwnershipOwner>)> {
        let mut conn = self.pool.acquire().await?;
        let record = ownership_repo::find_record(&mut conn, order_id)
            .await?
            .ok_or(TipError::OrderNotSettled(order_id))?;
        let owners = ownership_repo::owners_of_order(&mut conn, order_id).await?;
        Ok((record, owners))
    }
}

/// Compute the effective mode and owner weights for a settlement.
///
/// Item-based: each item's line amount is attributed to its owners (an
/// even split under explicit co-ownership); an employee's weight is
/// their total attributed cents. Primary-server-owns-all bypasses the
/// per-item split only when item-based resolution found more than one
/// owner AND the order sits at a table; helpers are then compensated
/// through tip-out rules at shift close, never through ownership.
pub(crate) fn resolve_owner_weights(
    settlement: &OrderSettlement,
) -> (OwnershipMode, Vec<(i64, Decimal)>) {
    // Aggregate per-employee contributions, preserving first appearance
    let mut owners: Vec<(i64, Decimal)> = Vec::new();
    let mut add = |employee_id: i64, amount: Decimal| {
        match owners.iter_mut().find(|(id, _)| *id == employee_id) {
            Some((_, w)) => *w += amount,
            None => owners.push((employee_id, amount)),
        }
    };

    for item in &settlement.items {
        let amount = Decimal::from(item.amount_cents.max(0));
        if item.owner_employee_ids.is_empty() {
            add(settlement.creator_employee_id, amount);
            continue;
        }
        let per_owner = amount / Decimal::from(item.owner_employee_ids.len() as i64);
        for owner in &item.owner_employee_ids {
            add(*owner, per_owner);
        }
    }

    owners.retain(|(_, w)| *w > Decimal::ZERO);
    if owners.is_empty() {
        // No item attribution at all: the creator owns the tip
        owners.push((settlement.creator_employee_id, Decimal::ONE));
    }

    if settlement.ownership_mode == OwnershipMode::PrimaryServerOwnsAll
        && owners.len() > 1
        && settlement.table_id.is_some()
    {
        return (
            OwnershipMode::PrimaryServerOwnsAll,
            vec![(settlement.creator_employee_id, Decimal::ONE)],
        );
    }
    (OwnershipMode::ItemBased, owners)
}

fn validate_settlement(settlement: &OrderSettlement) -> TipResult<()> {
    if settlement.tip_amount_cents < 0 || settlement.tip_amount_cents > MAX_AMOUNT_CENTS {
        return Err(TipError::InvalidAmount(format!(
            "tip amount must be within [0, {MAX_AMOUNT_CENTS}], got {}",
            settlement.tip_amount_cents
        )));
    }
    if settlement.subtotal_cents < 0 {
        return Err(TipError::InvalidAmount(format!(
            "subtotal must be non-negative, got {}",
            settlement.subtotal_cents
        )));
    }
    Ok(())
}
