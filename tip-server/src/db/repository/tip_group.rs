//! Tip group repository
//!
//! Groups, segments, members and replay credits. Segment transitions are
//! guarded by rows_affected checks against the open segment so concurrent
//! writers surface as conflicts instead of corrupting history.

use super::{RepoError, RepoResult};
use shared::models::{GroupCredit, SegmentMember, SplitMode, TipGroup, TipGroupSegment};
use sqlx::{SqliteConnection, SqlitePool};

// ── Groups ──────────────────────────────────────────────────────────

pub async fn insert_group(
    conn: &mut SqliteConnection,
    id: i64,
    template_id: Option<i64>,
    created_at: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO tip_group (id, template_id, status, created_at) VALUES (?, ?, 'active', ?)",
    )
    .bind(id)
    .bind(template_id)
    .bind(created_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_group(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<TipGroup>> {
    let group = sqlx::query_as::<_, TipGroup>(
        "SELECT id, template_id, status, created_at, closed_at FROM tip_group WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(group)
}

pub async fn find_active_groups(pool: &SqlitePool) -> RepoResult<Vec<TipGroup>> {
    let groups = sqlx::query_as::<_, TipGroup>(
        "SELECT id, template_id, status, created_at, closed_at FROM tip_group \
         WHERE status = 'active' ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(groups)
}

pub async fn find_active_by_template(
    conn: &mut SqliteConnection,
    template_id: i64,
) -> RepoResult<Option<TipGroup>> {
    let group = sqlx::query_as::<_, TipGroup>(
        "SELECT id, template_id, status, created_at, closed_at FROM tip_group \
         WHERE template_id = ? AND status = 'active'",
    )
    .bind(template_id)
    .fetch_optional(conn)
    .await?;
    Ok(group)
}

pub async fn close_group(conn: &mut SqliteConnection, id: i64, closed_at: i64) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE tip_group SET status = 'closed', closed_at = ? WHERE id = ? AND status = 'active'",
    )
    .bind(closed_at)
    .bind(id)
    .execute(conn)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Tip group {id} not found or already closed"
        )));
    }
    Ok(())
}

/// Take the group's write lock for the duration of the enclosing
/// transaction. Adjustments call this first so replay never races a
/// concurrent segment transition or credit.
pub async fn touch_group(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE tip_group SET status = status WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Tip group {id} not found")));
    }
    Ok(())
}

// ── Segments ────────────────────────────────────────────────────────

pub async fn insert_segment(
    conn: &mut SqliteConnection,
    id: i64,
    group_id: i64,
    start_at: i64,
    split_mode: SplitMode,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO tip_group_segment (id, group_id, start_at, split_mode) VALUES (?, ?, ?, ?)",
    )
    .bind(id)
    .bind(group_id)
    .bind(start_at)
    .bind(split_mode)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_segment(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<TipGroupSegment>> {
    let segment = sqlx::query_as::<_, TipGroupSegment>(
        "SELECT id, group_id, start_at, end_at, split_mode FROM tip_group_segment WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(segment)
}

pub async fn open_segment(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> RepoResult<Option<TipGroupSegment>> {
    let segment = sqlx::query_as::<_, TipGroupSegment>(
        "SELECT id, group_id, start_at, end_at, split_mode FROM tip_group_segment \
         WHERE group_id = ? AND end_at IS NULL",
    )
    .bind(group_id)
    .fetch_optional(conn)
    .await?;
    Ok(segment)
}

/// Close the open segment. rows_affected == 0 means another writer got
/// there first; callers map that to a segment lock conflict.
pub async fn close_open_segment(
    conn: &mut SqliteConnection,
    group_id: i64,
    segment_id: i64,
    end_at: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE tip_group_segment SET end_at = ? WHERE id = ? AND group_id = ? AND end_at IS NULL",
    )
    .bind(end_at)
    .bind(segment_id)
    .bind(group_id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected())
}

/// Segment covering `at`, or the latest one that started before `at`
/// (late-arriving settlements land on the most recently closed segment)
pub async fn segment_at(
    conn: &mut SqliteConnection,
    group_id: i64,
    at: i64,
) -> RepoResult<Option<TipGroupSegment>> {
    let segment = sqlx::query_as::<_, TipGroupSegment>(
        "SELECT id, group_id, start_at, end_at, split_mode FROM tip_group_segment \
         WHERE group_id = ? AND start_at <= ? ORDER BY start_at DESC LIMIT 1",
    )
    .bind(group_id)
    .bind(at)
    .fetch_optional(conn)
    .await?;
    Ok(segment)
}

pub async fn segments_of_group(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> RepoResult<Vec<TipGroupSegment>> {
    let segments = sqlx::query_as::<_, TipGroupSegment>(
        "SELECT id, group_id, start_at, end_at, split_mode FROM tip_group_segment \
         WHERE group_id = ? ORDER BY start_at",
    )
    .bind(group_id)
    .fetch_all(conn)
    .await?;
    Ok(segments)
}

/// Move one segment's boundaries (adjustment engine only; ordinary
/// operation never rewrites history)
pub async fn update_segment_bounds(
    conn: &mut SqliteConnection,
    segment_id: i64,
    start_at: i64,
    end_at: Option<i64>,
) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE tip_group_segment SET start_at = ?, end_at = ? WHERE id = ?")
        .bind(start_at)
        .bind(end_at)
        .bind(segment_id)
        .execute(conn)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Segment {segment_id} not found"
        )));
    }
    Ok(())
}

/// Active groups whose open segment started before `cutoff` (expiry sweep)
pub async fn find_idle_group_ids(pool: &SqlitePool, cutoff: i64) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT g.id FROM tip_group g JOIN tip_group_segment s ON s.group_id = g.id \
         WHERE g.status = 'active' AND s.end_at IS NULL AND s.start_at < ?",
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

// ── Members ─────────────────────────────────────────────────────────

pub async fn insert_member(
    conn: &mut SqliteConnection,
    segment_id: i64,
    employee_id: i64,
    position: i64,
    weight: f64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO segment_member (segment_id, employee_id, position, weight) VALUES (?, ?, ?, ?)",
    )
    .bind(segment_id)
    .bind(employee_id)
    .bind(position)
    .bind(weight)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn members_of_segment(
    conn: &mut SqliteConnection,
    segment_id: i64,
) -> RepoResult<Vec<SegmentMember>> {
    let members = sqlx::query_as::<_, SegmentMember>(
        "SELECT segment_id, employee_id, position, weight FROM segment_member \
         WHERE segment_id = ? ORDER BY position",
    )
    .bind(segment_id)
    .fetch_all(conn)
    .await?;
    Ok(members)
}

/// The group whose open segment contains this employee, if any — the
/// single-active-group invariant check
pub async fn find_active_membership(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> RepoResult<Option<i64>> {
    let group_id = sqlx::query_scalar::<_, i64>(
        "SELECT s.group_id FROM segment_member m \
         JOIN tip_group_segment s ON s.id = m.segment_id \
         JOIN tip_group g ON g.id = s.group_id \
         WHERE m.employee_id = ? AND s.end_at IS NULL AND g.status = 'active' \
         LIMIT 1",
    )
    .bind(employee_id)
    .fetch_optional(conn)
    .await?;
    Ok(group_id)
}

/// The group whose segment covered `at` for this employee, if any —
/// membership as of a historical instant (settlement-time routing)
pub async fn find_membership_at(
    conn: &mut SqliteConnection,
    employee_id: i64,
    at: i64,
) -> RepoResult<Option<i64>> {
    let group_id = sqlx::query_scalar::<_, i64>(
        "SELECT s.group_id FROM segment_member m \
         JOIN tip_group_segment s ON s.id = m.segment_id \
         WHERE m.employee_id = ? AND s.start_at <= ? AND (s.end_at IS NULL OR s.end_at > ?) \
         LIMIT 1",
    )
    .bind(employee_id)
    .bind(at)
    .bind(at)
    .fetch_optional(conn)
    .await?;
    Ok(group_id)
}

// ── Replay credits ──────────────────────────────────────────────────

pub async fn insert_credit(
    conn: &mut SqliteConnection,
    id: i64,
    group_id: i64,
    order_id: Option<i64>,
    amount_cents: i64,
    credited_at: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO group_credit (id, group_id, order_id, amount_cents, credited_at) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(group_id, order_id) WHERE order_id IS NOT NULL DO NOTHING",
    )
    .bind(id)
    .bind(group_id)
    .bind(order_id)
    .bind(amount_cents)
    .bind(credited_at)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn credits_of_group(
    conn: &mut SqliteConnection,
    group_id: i64,
) -> RepoResult<Vec<GroupCredit>> {
    let credits = sqlx::query_as::<_, GroupCredit>(
        "SELECT id, group_id, order_id, amount_cents, credited_at FROM group_credit \
         WHERE group_id = ? ORDER BY credited_at, id",
    )
    .bind(group_id)
    .fetch_all(conn)
    .await?;
    Ok(credits)
}

/// Update a replay credit's amount (tip_amount adjustments keep the
/// replay fact in sync with the corrected settlement)
pub async fn update_credit_amount(
    conn: &mut SqliteConnection,
    group_id: i64,
    order_id: i64,
    amount_cents: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE group_credit SET amount_cents = ? WHERE group_id = ? AND order_id = ?")
        .bind(amount_cents)
        .bind(group_id)
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}
