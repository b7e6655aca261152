use super::*;
use crate::db::repository::shift as shift_repo;
use crate::tips::TipError;
use shared::models::{EntryType, SplitMode};
use shared::util::now_millis;

#[tokio::test]
async fn create_and_grow_group_slices_history_into_segments() {
    let state = test_state().await;

    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    state.groups.add_member(group_id, BEN).await.unwrap();

    let history = state.groups.group_history(group_id).await.unwrap();
    assert_eq!(history.len(), 2);

    // First segment closed with one member at 100%
    assert!(history[0].end_at.is_some());
    assert_eq!(history[0].members.len(), 1);
    assert_eq!(history[0].members[0].share, 1.0);

    // Second segment open with two members; shares sum to 1.0
    assert!(history[1].end_at.is_none());
    assert_eq!(history[1].members.len(), 2);
    let share_sum: f64 = history[1].members.iter().map(|m| m.share).sum();
    assert!((share_sum - 1.0).abs() < 1e-9);

    // Segments tile the timeline: closed end == successor start
    assert_eq!(history[0].end_at.unwrap(), history[1].start_at);
}

#[tokio::test]
async fn equal_credit_splits_two_ways() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();

    let entries = state
        .groups
        .credit_group(group_id, 1000, Some(9001), now_millis())
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry.entry_type, EntryType::GroupShare);
        assert_eq!(entry.amount_cents, 500);
        assert_eq!(entry.reference_group_id, Some(group_id));
        assert_eq!(entry.reference_order_id, Some(9001));
    }
}

#[tokio::test]
async fn equal_credit_three_ways_gives_remainder_to_earliest_member() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();
    state.groups.add_member(group_id, CARLA).await.unwrap();

    let entries = state
        .groups
        .credit_group(group_id, 1000, Some(9002), now_millis())
        .await
        .unwrap();

    assert_eq!(entries.len(), 3);
    let by_employee: Vec<(i64, i64)> =
        entries.iter().map(|e| (e.employee_id, e.amount_cents)).collect();
    assert!(by_employee.contains(&(ANA, 334)));
    assert!(by_employee.contains(&(BEN, 333)));
    assert!(by_employee.contains(&(CARLA, 333)));
    assert_eq!(entries.iter().map(|e| e.amount_cents).sum::<i64>(), 1000);
}

#[tokio::test]
async fn single_group_invariant_blocks_double_membership() {
    let state = test_state().await;
    let g1 = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    let g2 = state
        .groups
        .create_group(None, SplitMode::Equal, BEN)
        .await
        .unwrap();

    let err = state.groups.add_member(g2, ANA).await.unwrap_err();
    match err {
        TipError::AlreadyInGroup {
            employee_id,
            group_id,
        } => {
            assert_eq!(employee_id, ANA);
            assert_eq!(group_id, g1);
        }
        other => panic!("expected AlreadyInGroup, got {other:?}"),
    }

    // No segment mutation happened on the target group
    let history = state.groups.group_history(g2).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].members.len(), 1);
}

#[tokio::test]
async fn last_member_leaving_closes_the_group() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();

    let seg = state.groups.remove_member(group_id, ANA).await.unwrap();
    assert!(seg.is_some());

    let seg = state.groups.remove_member(group_id, BEN).await.unwrap();
    assert!(seg.is_none());

    assert!(state.groups.active_groups().await.unwrap().is_empty());

    // Closed group rejects further membership changes
    assert!(matches!(
        state.groups.add_member(group_id, CARLA).await,
        Err(TipError::GroupClosed(_))
    ));
}

#[tokio::test]
async fn removing_a_non_member_fails_cleanly() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();

    assert!(matches!(
        state.groups.remove_member(group_id, BEN).await,
        Err(TipError::NotAGroupMember { .. })
    ));
}

#[tokio::test]
async fn late_credit_lands_on_most_recent_segment() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();
    let credited_at = now_millis();

    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    state.groups.remove_member(group_id, ANA).await.unwrap();
    state.groups.remove_member(group_id, BEN).await.unwrap();

    // Settlement arrives after the group already closed; it lands on
    // the segment that was open at the settlement instant
    let entries = state
        .groups
        .credit_group(group_id, 600, Some(9003), credited_at)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries.iter().map(|e| e.amount_cents).sum::<i64>(), 600);
}

#[tokio::test]
async fn hours_weighted_credit_follows_hours_facts() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::HoursWeighted, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();

    let history = state.groups.group_history(group_id).await.unwrap();
    let open_segment_id = history.last().unwrap().id;

    let mut conn = state.pool.acquire().await.unwrap();
    shift_repo::upsert_segment_hours(&mut conn, open_segment_id, ANA, 6.0)
        .await
        .unwrap();
    shift_repo::upsert_segment_hours(&mut conn, open_segment_id, BEN, 2.0)
        .await
        .unwrap();
    drop(conn);

    let entries = state
        .groups
        .credit_group(group_id, 1000, Some(9004), now_millis())
        .await
        .unwrap();
    let by_employee: Vec<(i64, i64)> =
        entries.iter().map(|e| (e.employee_id, e.amount_cents)).collect();
    assert!(by_employee.contains(&(ANA, 750)));
    assert!(by_employee.contains(&(BEN, 250)));
}

#[tokio::test]
async fn hours_weighted_credit_falls_back_to_equal_without_facts() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::HoursWeighted, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();

    let entries = state
        .groups
        .credit_group(group_id, 1000, Some(9005), now_millis())
        .await
        .unwrap();
    assert!(entries.iter().all(|e| e.amount_cents == 500));
}

#[tokio::test]
async fn role_weighted_credit_uses_role_tip_weights() {
    let state = test_state().await;
    // Eva is a head server (1.5), Dani a busser (0.5)
    let group_id = state
        .groups
        .create_group(None, SplitMode::RoleWeighted, EVA)
        .await
        .unwrap();
    state.groups.add_member(group_id, DANI).await.unwrap();

    let entries = state
        .groups
        .credit_group(group_id, 1000, Some(9006), now_millis())
        .await
        .unwrap();
    let by_employee: Vec<(i64, i64)> =
        entries.iter().map(|e| (e.employee_id, e.amount_cents)).collect();
    assert!(by_employee.contains(&(EVA, 750)));
    assert!(by_employee.contains(&(DANI, 250)));
}

#[tokio::test]
async fn crediting_an_unknown_group_fails() {
    let state = test_state().await;
    assert!(matches!(
        state.groups.credit_group(424242, 1000, None, now_millis()).await,
        Err(TipError::GroupNotFound(_))
    ));
}

#[tokio::test]
async fn expiry_sweep_closes_idle_groups() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();

    // Nothing is older than a future cutoff of "now + 1h"
    let expired = state
        .groups
        .expire_idle_groups(now_millis() + 3_600_000)
        .await
        .unwrap();
    assert_eq!(expired, 1);

    assert!(state.groups.active_groups().await.unwrap().is_empty());
    let history = state.groups.group_history(group_id).await.unwrap();
    assert!(history.iter().all(|s| s.end_at.is_some()));

    // A second sweep finds nothing
    let expired = state
        .groups
        .expire_idle_groups(now_millis() + 3_600_000)
        .await
        .unwrap();
    assert_eq!(expired, 0);
}
