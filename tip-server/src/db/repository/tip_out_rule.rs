//! Tip-out rule repository

use super::{RepoError, RepoResult};
use shared::models::{TipOutRule, TipOutRuleUpsert};
use sqlx::SqliteConnection;

pub async fn upsert(conn: &mut SqliteConnection, data: &TipOutRuleUpsert) -> RepoResult<()> {
    if !data.percent.is_finite() || !(0.0..=100.0).contains(&data.percent) {
        return Err(RepoError::Validation(format!(
            "percent must be between 0 and 100, got {}",
            data.percent
        )));
    }
    sqlx::query(
        "INSERT INTO tip_out_rule (id, giver_role_id, receiver_role_id, percent, basis, active) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET giver_role_id = excluded.giver_role_id, \
         receiver_role_id = excluded.receiver_role_id, percent = excluded.percent, \
         basis = excluded.basis, active = excluded.active",
    )
    .bind(data.id)
    .bind(data.giver_role_id)
    .bind(data.receiver_role_id)
    .bind(data.percent)
    .bind(data.basis)
    .bind(data.active)
    .execute(conn)
    .await?;
    Ok(())
}

/// Active rules where the given role is the giver, in stable id order
pub async fn find_for_giver_role(
    conn: &mut SqliteConnection,
    giver_role_id: i64,
) -> RepoResult<Vec<TipOutRule>> {
    let rules = sqlx::query_as::<_, TipOutRule>(
        "SELECT id, giver_role_id, receiver_role_id, percent, basis, active FROM tip_out_rule \
         WHERE giver_role_id = ? AND active = 1 ORDER BY id",
    )
    .bind(giver_role_id)
    .fetch_all(conn)
    .await?;
    Ok(rules)
}
