//! Tip-out rule engine
//!
//! At shift close, role-pair rules redistribute part of what a giver
//! earned during the shift: one TIPOUT_DEBIT against the giver, one
//! TIPOUT_CREDIT per receiver. Keys are derived from (shift, rule,
//! employee), so re-running a shift close never double-debits.

use super::error::{TipError, TipResult};
use super::ledger::append_tx;
use super::money::{allocate, equal_weights, percent_of};
use crate::db::repository::{ledger as ledger_repo, shift as shift_repo, tip_out_rule as rule_repo};
use shared::models::{EntryType, LedgerEntry, NewLedgerEntry, ShiftCloseEvent, TipOutBasis};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

/// Tip-out rule engine
#[derive(Clone)]
pub struct TipOutEngine {
    pool: SqlitePool,
}

impl TipOutEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Close a shift and apply its tip-out rules in one unit of work
    pub async fn close_shift(&self, event: &ShiftCloseEvent) -> TipResult<Vec<LedgerEntry>> {
        let at = event.at.unwrap_or_else(now_millis);
        let mut tx = self.pool.begin().await?;

        let shift = shift_repo::find_shift(&mut tx, event.shift_id)
            .await?
            .ok_or(TipError::ShiftNotFound(event.shift_id))?;
        if shift.employee_id != event.employee_id {
            return Err(TipError::ShiftNotFound(event.shift_id));
        }
        if shift.end_at.is_none() {
            shift_repo::close_shift(&mut tx, event.shift_id, at, event.net_sales_cents).await?;
        }

        let entries = apply_tip_outs_tx(&mut tx, event.employee_id, event.shift_id).await?;
        tx.commit().await?;
        tracing::info!(
            employee_id = event.employee_id,
            shift_id = event.shift_id,
            entries = entries.len(),
            "Shift closed, tip-outs applied"
        );
        Ok(entries)
    }

    /// Apply tip-out rules for an already-closed shift (idempotent;
    /// re-running posts nothing new)
    pub async fn apply_tip_outs(
        &self,
        employee_id: i64,
        shift_id: i64,
    ) -> TipResult<Vec<LedgerEntry>> {
        let mut tx = self.pool.begin().await?;
        let entries = apply_tip_outs_tx(&mut tx, employee_id, shift_id).await?;
        tx.commit().await?;
        Ok(entries)
    }
}

pub(crate) async fn apply_tip_outs_tx(
    conn: &mut SqliteConnection,
    employee_id: i64,
    shift_id: i64,
) -> TipResult<Vec<LedgerEntry>> {
    let shift = shift_repo::find_shift(conn, shift_id)
        .await?
        .ok_or(TipError::ShiftNotFound(shift_id))?;
    if shift.employee_id != employee_id {
        return Err(TipError::ShiftNotFound(shift_id));
    }

    let window_start = shift.start_at;
    let window_end = shift.end_at.unwrap_or_else(now_millis);

    let rules = rule_repo::find_for_giver_role(conn, shift.role_id).await?;
    let now = now_millis();
    let mut entries = Vec::new();

    for rule in rules {
        let basis_cents = match rule.basis {
            TipOutBasis::GrossTips => {
                ledger_repo::sum_tip_credits_in_window(conn, employee_id, window_start, window_end)
                    .await?
            }
            TipOutBasis::NetSales => shift.net_sales_cents.unwrap_or(0),
        };
        let amount = percent_of(basis_cents.max(0), rule.percent)?;
        if amount == 0 {
            continue;
        }

        let receivers = shift_repo::employees_on_shift_by_role(
            conn,
            rule.receiver_role_id,
            window_start,
            window_end,
            employee_id,
        )
        .await?;
        if receivers.is_empty() {
            tracing::debug!(
                rule_id = rule.id,
                shift_id,
                "No receivers on shift for tip-out rule, skipping"
            );
            continue;
        }

        let (debit, duplicate) = append_tx(
            conn,
            NewLedgerEntry::new(
                employee_id,
                -amount,
                EntryType::TipoutDebit,
                format!("tipout:{shift_id}:{}:{employee_id}", rule.id),
            ),
            now,
        )
        .await?;
        if duplicate {
            // This rule already ran for this shift
            tracing::debug!(rule_id = rule.id, shift_id, "Tip-out already applied, skipping");
            continue;
        }
        entries.push(debit);

        let shares = allocate(amount, &equal_weights(receivers.len()))?;
        for (receiver, share) in receivers.iter().zip(shares) {
            if share == 0 {
                continue;
            }
            let (credit, _) = append_tx(
                conn,
                NewLedgerEntry::new(
                    *receiver,
                    share,
                    EntryType::TipoutCredit,
                    format!("tipout:{shift_id}:{}:{receiver}", rule.id),
                ),
                now,
            )
            .await?;
            entries.push(credit);
        }
    }
    Ok(entries)
}
