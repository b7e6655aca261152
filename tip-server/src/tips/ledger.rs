//! Ledger service
//!
//! Thin engine wrapper over the ledger repository: balances, audit-trail
//! queries and cash payout recording. Every other engine appends through
//! [`append_tx`] so duplicate handling stays in one place.

use super::error::{TipError, TipResult};
use super::money::MAX_AMOUNT_CENTS;
use crate::db::repository::ledger;
use shared::models::{EntryType, LedgerEntry, NewLedgerEntry, PayoutRequest};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

/// Append inside an existing unit of work.
///
/// Returns the entry and whether it was a duplicate (an earlier append
/// with the same idempotency key won; nothing new was written).
pub(crate) async fn append_tx(
    conn: &mut SqliteConnection,
    entry: NewLedgerEntry,
    now: i64,
) -> TipResult<(LedgerEntry, bool)> {
    let outcome = ledger::append(conn, &entry, now).await?;
    if outcome.duplicate {
        let existing = ledger::find_by_id(conn, outcome.entry_id)
            .await?
            .ok_or_else(|| {
                TipError::Repo(crate::db::repository::RepoError::Database(format!(
                    "duplicate append but entry {} missing",
                    outcome.entry_id
                )))
            })?;
        return Ok((existing, true));
    }
    Ok((
        LedgerEntry {
            id: outcome.entry_id,
            employee_id: entry.employee_id,
            amount_cents: entry.amount_cents,
            entry_type: entry.entry_type,
            reference_order_id: entry.reference_order_id,
            reference_group_id: entry.reference_group_id,
            reference_adjustment_id: entry.reference_adjustment_id,
            idempotency_key: entry.idempotency_key,
            created_at: now,
        },
        false,
    ))
}

/// Ledger reporting and payout surface
#[derive(Clone)]
pub struct LedgerService {
    pool: SqlitePool,
}

impl LedgerService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Balance = sum of all entries up to `as_of` (now when absent)
    pub async fn balance_as_of(&self, employee_id: i64, as_of: Option<i64>) -> TipResult<i64> {
        let as_of = as_of.unwrap_or_else(now_millis);
        Ok(ledger::balance_as_of(&self.pool, employee_id, as_of).await?)
    }

    /// Audit-trail view over [start, end), optionally filtered by type
    pub async fn entries(
        &self,
        employee_id: i64,
        start_millis: i64,
        end_millis: i64,
        entry_type: Option<EntryType>,
    ) -> TipResult<Vec<LedgerEntry>> {
        Ok(ledger::find_by_employee(&self.pool, employee_id, start_millis, end_millis, entry_type)
            .await?)
    }

    /// Record a cash payout as a negative PAYOUT_CASH entry
    pub async fn record_payout(
        &self,
        employee_id: i64,
        req: &PayoutRequest,
    ) -> TipResult<LedgerEntry> {
        if req.amount_cents <= 0 || req.amount_cents > MAX_AMOUNT_CENTS {
            return Err(TipError::InvalidAmount(format!(
                "payout amount must be positive and within bounds, got {}",
                req.amount_cents
            )));
        }

        let now = now_millis();
        let mut tx = self.pool.begin().await?;
        let (entry, duplicate) = append_tx(
            &mut tx,
            NewLedgerEntry::new(
                employee_id,
                -req.amount_cents,
                EntryType::PayoutCash,
                format!("payout:{}", req.payout_id),
            ),
            now,
        )
        .await?;
        tx.commit().await?;

        if duplicate {
            tracing::debug!(payout_id = req.payout_id, "Payout already recorded");
        } else {
            tracing::info!(
                employee_id,
                amount_cents = req.amount_cents,
                recorded_by = req.recorded_by_employee_id,
                "Cash payout recorded"
            );
        }
        Ok(entry)
    }
}
