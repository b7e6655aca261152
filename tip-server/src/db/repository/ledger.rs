//! Ledger Repository
//!
//! The only write operation is `append`. Updates and deletes do not
//! exist: a correction is always a new entry, and balances are sums over
//! history. Appends are idempotent under retry via the UNIQUE
//! idempotency_key.

use super::{RepoError, RepoResult};
use shared::models::{EntryType, LedgerEntry, NewLedgerEntry};
use shared::util::snowflake_id;
use sqlx::{SqliteConnection, SqlitePool};

/// Outcome of an append: the entry id, and whether the key already existed
#[derive(Debug, Clone, Copy)]
pub struct AppendOutcome {
    pub entry_id: i64,
    /// true = a previous append with this idempotency key won; no new row
    pub duplicate: bool,
}

/// Append an entry. Duplicate idempotency keys are a no-op returning the
/// existing entry id, which makes every ledger-producing path retry-safe.
pub async fn append(
    conn: &mut SqliteConnection,
    entry: &NewLedgerEntry,
    now: i64,
) -> RepoResult<AppendOutcome> {
    if entry.idempotency_key.trim().is_empty() {
        return Err(RepoError::Validation(
            "idempotency_key must not be empty".into(),
        ));
    }

    let id = snowflake_id();
    let rows = sqlx::query(
        "INSERT INTO ledger_entry (id, employee_id, amount_cents, entry_type, reference_order_id, reference_group_id, reference_adjustment_id, idempotency_key, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT(idempotency_key) DO NOTHING",
    )
    .bind(id)
    .bind(entry.employee_id)
    .bind(entry.amount_cents)
    .bind(entry.entry_type)
    .bind(entry.reference_order_id)
    .bind(entry.reference_group_id)
    .bind(entry.reference_adjustment_id)
    .bind(&entry.idempotency_key)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if rows.rows_affected() == 1 {
        return Ok(AppendOutcome {
            entry_id: id,
            duplicate: false,
        });
    }

    // Benign duplicate: surface the entry that won the original append
    let existing = find_by_idempotency_key(conn, &entry.idempotency_key)
        .await?
        .ok_or_else(|| {
            RepoError::Database(format!(
                "idempotency conflict but no entry for key {}",
                entry.idempotency_key
            ))
        })?;
    tracing::debug!(
        idempotency_key = %entry.idempotency_key,
        entry_id = existing.id,
        "Duplicate ledger append ignored"
    );
    Ok(AppendOutcome {
        entry_id: existing.id,
        duplicate: true,
    })
}

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<LedgerEntry>> {
    let entry = sqlx::query_as::<_, LedgerEntry>(
        "SELECT id, employee_id, amount_cents, entry_type, reference_order_id, reference_group_id, reference_adjustment_id, idempotency_key, created_at \
         FROM ledger_entry WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(entry)
}

pub async fn find_by_idempotency_key(
    conn: &mut SqliteConnection,
    key: &str,
) -> RepoResult<Option<LedgerEntry>> {
    let entry = sqlx::query_as::<_, LedgerEntry>(
        "SELECT id, employee_id, amount_cents, entry_type, reference_order_id, reference_group_id, reference_adjustment_id, idempotency_key, created_at \
         FROM ledger_entry WHERE idempotency_key = ?",
    )
    .bind(key)
    .fetch_optional(conn)
    .await?;
    Ok(entry)
}

/// Balance = sum of all entries with created_at <= as_of
pub async fn balance_as_of(pool: &SqlitePool, employee_id: i64, as_of: i64) -> RepoResult<i64> {
    let balance = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM ledger_entry WHERE employee_id = ? AND created_at <= ?",
    )
    .bind(employee_id)
    .bind(as_of)
    .fetch_one(pool)
    .await?;
    Ok(balance)
}

/// Audit-trail view: entries for one employee in [start, end), newest first
pub async fn find_by_employee(
    pool: &SqlitePool,
    employee_id: i64,
    start_millis: i64,
    end_millis: i64,
    entry_type: Option<EntryType>,
) -> RepoResult<Vec<LedgerEntry>> {
    let entries = match entry_type {
        Some(t) => {
            sqlx::query_as::<_, LedgerEntry>(
                "SELECT id, employee_id, amount_cents, entry_type, reference_order_id, reference_group_id, reference_adjustment_id, idempotency_key, created_at \
                 FROM ledger_entry WHERE employee_id = ? AND created_at >= ? AND created_at < ? AND entry_type = ? \
                 ORDER BY created_at DESC, id DESC",
            )
            .bind(employee_id)
            .bind(start_millis)
            .bind(end_millis)
            .bind(t)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, LedgerEntry>(
                "SELECT id, employee_id, amount_cents, entry_type, reference_order_id, reference_group_id, reference_adjustment_id, idempotency_key, created_at \
                 FROM ledger_entry WHERE employee_id = ? AND created_at >= ? AND created_at < ? \
                 ORDER BY created_at DESC, id DESC",
            )
            .bind(employee_id)
            .bind(start_millis)
            .bind(end_millis)
            .fetch_all(pool)
            .await?
        }
    };
    Ok(entries)
}

/// All entries produced by one order's settlement (and its corrections)
pub async fn find_by_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<LedgerEntry>> {
    let entries = sqlx::query_as::<_, LedgerEntry>(
        "SELECT id, employee_id, amount_cents, entry_type, reference_order_id, reference_group_id, reference_adjustment_id, idempotency_key, created_at \
         FROM ledger_entry WHERE reference_order_id = ? ORDER BY created_at, id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(entries)
}

/// Net posted per employee for one order (settlement entries + corrections)
pub async fn sum_by_employee_for_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<(i64, i64)>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT employee_id, COALESCE(SUM(amount_cents), 0) FROM ledger_entry \
         WHERE reference_order_id = ? GROUP BY employee_id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Net posted per employee through one group (shares + corrections)
pub async fn sum_by_employee_for_group(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> RepoResult<Vec<(i64, i64)>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT employee_id, COALESCE(SUM(amount_cents), 0) FROM ledger_entry \
         WHERE reference_group_id = ? GROUP BY employee_id",
    )
    .bind(group_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// Groups that an order's settlement was routed through
pub async fn groups_for_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT reference_group_id FROM ledger_entry \
         WHERE reference_order_id = ? AND reference_group_id IS NOT NULL",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}

/// Gross tip credits (DIRECT_TIP + GROUP_SHARE) for one employee in
/// [start, end] — the gross_tips basis for tip-out rules. The end bound
/// is inclusive: a tip credited at the close instant belongs to the shift.
pub async fn sum_tip_credits_in_window(
    conn: &mut SqliteConnection,
    employee_id: i64,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<i64> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM ledger_entry \
         WHERE employee_id = ? AND created_at >= ? AND created_at <= ? \
         AND entry_type IN ('DIRECT_TIP', 'GROUP_SHARE')",
    )
    .bind(employee_id)
    .bind(start_millis)
    .bind(end_millis)
    .fetch_one(conn)
    .await?;
    Ok(total)
}
