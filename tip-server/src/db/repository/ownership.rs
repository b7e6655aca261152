//! Ownership snapshot repository
//!
//! Records are written once at settlement. The owner-weight replacement
//! and tip-amount update exist for the adjustment engine only.

use super::{RepoError, RepoResult};
use shared::models::{OwnershipOwner, OwnershipRecord};
use sqlx::SqliteConnection;

pub async fn insert_record(
    conn: &mut SqliteConnection,
    record: &OwnershipRecord,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO ownership_record (order_id, mode, tip_amount_cents, subtotal_cents, table_id, creator_employee_id, resolved_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.order_id)
    .bind(record.mode)
    .bind(record.tip_amount_cents)
    .bind(record.subtotal_cents)
    .bind(record.table_id)
    .bind(record.creator_employee_id)
    .bind(record.resolved_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_record(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Option<OwnershipRecord>> {
    let record = sqlx::query_as::<_, OwnershipRecord>(
        "SELECT order_id, mode, tip_amount_cents, subtotal_cents, table_id, creator_employee_id, resolved_at \
         FROM ownership_record WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(record)
}

pub async fn insert_owner(conn: &mut SqliteConnection, owner: &OwnershipOwner) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO ownership_owner (order_id, employee_id, position, weight) VALUES (?, ?, ?, ?)",
    )
    .bind(owner.order_id)
    .bind(owner.employee_id)
    .bind(owner.position)
    .bind(owner.weight)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn owners_of_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<OwnershipOwner>> {
    let owners = sqlx::query_as::<_, OwnershipOwner>(
        "SELECT order_id, employee_id, position, weight FROM ownership_owner \
         WHERE order_id = ? ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(owners)
}

/// Replace the owner set (ownership_split adjustments)
pub async fn replace_owners(
    conn: &mut SqliteConnection,
    order_id: i64,
    owners: &[OwnershipOwner],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM ownership_owner WHERE order_id = ?")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    for owner in owners {
        insert_owner(conn, owner).await?;
    }
    Ok(())
}

/// Correct the recorded tip amount (tip_amount adjustments)
pub async fn update_tip_amount(
    conn: &mut SqliteConnection,
    order_id: i64,
    tip_amount_cents: i64,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE ownership_record SET tip_amount_cents = ? WHERE order_id = ?")
        .bind(tip_amount_cents)
        .bind(order_id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Ownership record for order {order_id} not found"
        )));
    }
    Ok(())
}
