use super::*;
use crate::db::repository::{ledger as ledger_repo, shift as shift_repo};
use crate::tips::TipError;
use shared::models::{
    AdjustmentCommand, AdjustmentRequest, EmployeeDelta, EntryType, OwnerWeight, SplitMode,
};
use shared::util::now_millis;

fn request(reason: &str, command: AdjustmentCommand) -> AdjustmentRequest {
    AdjustmentRequest {
        reason: reason.into(),
        created_by_employee_id: EVA,
        command,
    }
}

#[tokio::test]
async fn boundary_move_corrects_posted_credit_without_touching_originals() {
    let state = test_state().await;

    // Ana and Ben pool; Carla joins late
    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    state.groups.add_member(group_id, CARLA).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;

    // $15.00 credited while all three are pooled → $5.00 each
    let credited_at = now_millis();
    state
        .groups
        .credit_group(group_id, 1500, Some(500), credited_at)
        .await
        .unwrap();

    let history = state.groups.group_history(group_id).await.unwrap();
    let three_member_segment = history.last().unwrap();
    assert_eq!(three_member_segment.members.len(), 3);

    // The manager decides Carla actually joined after the credit:
    // the three-member segment starts just past the credit instant
    let result = state
        .adjustments
        .apply(&request(
            "Carla joined after the table settled",
            AdjustmentCommand::GroupMembership {
                group_id,
                segment_id: three_member_segment.id,
                new_start_at: Some(credited_at + 1),
                new_end_at: None,
            },
        ))
        .await
        .unwrap();

    // Corrected 2-way split is $7.50 each: +2.50, +2.50, −5.00
    assert_eq!(
        result.corrections,
        vec![
            EmployeeDelta { employee_id: ANA, amount_cents: 250 },
            EmployeeDelta { employee_id: BEN, amount_cents: 250 },
            EmployeeDelta { employee_id: CARLA, amount_cents: -500 },
        ]
    );
    assert!(result.adjustment.auto_recalc_ran);

    // The three original $5.00 entries are untouched
    let mut conn = state.pool.acquire().await.unwrap();
    let order_entries = ledger_repo::find_by_order(&mut conn, 500).await.unwrap();
    drop(conn);
    assert_eq!(order_entries.len(), 3);
    assert!(order_entries.iter().all(|e| e.amount_cents == 500));
    assert!(order_entries.iter().all(|e| e.entry_type == EntryType::GroupShare));

    // Net balances land on the corrected totals
    assert_eq!(state.ledger.balance_as_of(ANA, None).await.unwrap(), 750);
    assert_eq!(state.ledger.balance_as_of(BEN, None).await.unwrap(), 750);
    assert_eq!(state.ledger.balance_as_of(CARLA, None).await.unwrap(), 0);

    // Corrections carry the adjustment reference
    let corrections = state
        .ledger
        .entries(CARLA, 0, now_millis() + 1, Some(EntryType::Correction))
        .await
        .unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(
        corrections[0].reference_adjustment_id,
        Some(result.adjustment.id)
    );
}

#[tokio::test]
async fn replaying_already_corrected_facts_posts_nothing() {
    let state = test_state().await;
    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    state
        .groups
        .credit_group(group_id, 1000, Some(501), now_millis())
        .await
        .unwrap();

    let history = state.groups.group_history(group_id).await.unwrap();
    let open_segment = history.last().unwrap();

    // A boundary "move" to the value it already has changes nothing
    let result = state
        .adjustments
        .apply(&request(
            "no-op audit check",
            AdjustmentCommand::GroupMembership {
                group_id,
                segment_id: open_segment.id,
                new_start_at: Some(open_segment.start_at),
                new_end_at: None,
            },
        ))
        .await
        .unwrap();
    assert!(result.corrections.is_empty());
}

#[tokio::test]
async fn ownership_split_adjustment_rebalances_an_order() {
    let state = test_state().await;

    state
        .resolver
        .settle_order(&split_settlement(1, 2000, ANA, BEN, OwnershipMode::ItemBased, Some(4)))
        .await
        .unwrap();

    let result = state
        .adjustments
        .apply(&request(
            "both servers worked the table equally",
            AdjustmentCommand::OwnershipSplit {
                order_id: 1,
                owners: vec![
                    OwnerWeight { employee_id: ANA, weight: 1.0 },
                    OwnerWeight { employee_id: BEN, weight: 1.0 },
                ],
            },
        ))
        .await
        .unwrap();

    assert_eq!(
        result.corrections,
        vec![
            EmployeeDelta { employee_id: ANA, amount_cents: -400 },
            EmployeeDelta { employee_id: BEN, amount_cents: 400 },
        ]
    );

    // Original settlement entries unchanged, corrections appended
    let mut conn = state.pool.acquire().await.unwrap();
    let order_entries = ledger_repo::find_by_order(&mut conn, 1).await.unwrap();
    drop(conn);
    let originals: Vec<&_> = order_entries
        .iter()
        .filter(|e| e.entry_type == EntryType::DirectTip)
        .collect();
    assert_eq!(originals.len(), 2);
    assert!(originals.iter().any(|e| e.amount_cents == 1400));
    assert!(originals.iter().any(|e| e.amount_cents == 600));

    assert_eq!(state.ledger.balance_as_of(ANA, None).await.unwrap(), 1000);
    assert_eq!(state.ledger.balance_as_of(BEN, None).await.unwrap(), 1000);
}

#[tokio::test]
async fn tip_amount_adjustment_posts_the_difference() {
    let state = test_state().await;

    state
        .resolver
        .settle_order(&simple_settlement(2, 1000, ANA))
        .await
        .unwrap();

    let result = state
        .adjustments
        .apply(&request(
            "receipt shows 15.00, entered as 10.00",
            AdjustmentCommand::TipAmount {
                order_id: 2,
                tip_amount_cents: 1500,
            },
        ))
        .await
        .unwrap();

    assert_eq!(
        result.corrections,
        vec![EmployeeDelta { employee_id: ANA, amount_cents: 500 }]
    );
    assert_eq!(state.ledger.balance_as_of(ANA, None).await.unwrap(), 1500);

    let (record, _) = state.resolver.record_of(2).await.unwrap();
    assert_eq!(record.tip_amount_cents, 1500);
}

#[tokio::test]
async fn clock_fix_adjustment_reweights_an_hours_split() {
    let state = test_state().await;

    let group_id = state
        .groups
        .create_group(None, SplitMode::HoursWeighted, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();

    let history = state.groups.group_history(group_id).await.unwrap();
    let segment_id = history.last().unwrap().id;

    let mut conn = state.pool.acquire().await.unwrap();
    shift_repo::upsert_segment_hours(&mut conn, segment_id, ANA, 2.0).await.unwrap();
    shift_repo::upsert_segment_hours(&mut conn, segment_id, BEN, 2.0).await.unwrap();
    drop(conn);

    state
        .groups
        .credit_group(group_id, 1000, Some(502), now_millis())
        .await
        .unwrap();

    // Time clock actually had Ben at 6 hours
    let result = state
        .adjustments
        .apply(&request(
            "time clock import missed Ben's double",
            AdjustmentCommand::ClockFix {
                segment_id,
                employee_id: BEN,
                hours: 6.0,
            },
        ))
        .await
        .unwrap();

    // Corrected weights 2/6 → 250/750 against the posted 500/500
    assert_eq!(
        result.corrections,
        vec![
            EmployeeDelta { employee_id: ANA, amount_cents: -250 },
            EmployeeDelta { employee_id: BEN, amount_cents: 250 },
        ]
    );
}

#[tokio::test]
async fn manual_override_posts_explicit_deltas_without_replay() {
    let state = test_state().await;

    let result = state
        .adjustments
        .apply(&request(
            "drawer shortage charged back",
            AdjustmentCommand::ManualOverride {
                deltas: vec![EmployeeDelta { employee_id: ANA, amount_cents: -250 }],
            },
        ))
        .await
        .unwrap();

    assert!(!result.adjustment.auto_recalc_ran);
    assert_eq!(state.ledger.balance_as_of(ANA, None).await.unwrap(), -250);
}

#[tokio::test]
async fn failed_adjustment_rolls_back_entirely() {
    let state = test_state().await;

    state
        .resolver
        .settle_order(&split_settlement(3, 2000, ANA, BEN, OwnershipMode::ItemBased, None))
        .await
        .unwrap();
    let (_, owners_before) = state.resolver.record_of(3).await.unwrap();

    let err = state
        .adjustments
        .apply(&request(
            "bad weights",
            AdjustmentCommand::OwnershipSplit {
                order_id: 3,
                owners: vec![OwnerWeight { employee_id: ANA, weight: 0.0 }],
            },
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, TipError::AdjustmentFailed(_)));

    // No adjustment record, no corrections, facts untouched
    assert!(state.adjustments.find_all(50, 0).await.unwrap().is_empty());
    let (_, owners_after) = state.resolver.record_of(3).await.unwrap();
    assert_eq!(owners_before.len(), owners_after.len());
    assert_eq!(state.ledger.balance_as_of(ANA, None).await.unwrap(), 1400);
}

#[tokio::test]
async fn adjustment_requires_a_reason() {
    let state = test_state().await;
    let err = state
        .adjustments
        .apply(&request(
            "  ",
            AdjustmentCommand::ManualOverride {
                deltas: vec![EmployeeDelta { employee_id: ANA, amount_cents: 100 }],
            },
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, TipError::AdjustmentFailed(_)));
}

#[tokio::test]
async fn adjustment_on_unsettled_order_fails() {
    let state = test_state().await;
    let err = state
        .adjustments
        .apply(&request(
            "typo fix",
            AdjustmentCommand::TipAmount {
                order_id: 999,
                tip_amount_cents: 100,
            },
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, TipError::AdjustmentFailed(_)));
}

#[tokio::test]
async fn adjustment_audit_trail_is_queryable() {
    let state = test_state().await;

    let result = state
        .adjustments
        .apply(&request(
            "spot bonus",
            AdjustmentCommand::ManualOverride {
                deltas: vec![EmployeeDelta { employee_id: BEN, amount_cents: 500 }],
            },
        ))
        .await
        .unwrap();

    let stored = state
        .adjustments
        .find_by_id(result.adjustment.id)
        .await
        .unwrap();
    assert_eq!(stored.reason, "spot bonus");
    assert_eq!(stored.created_by_employee_id, EVA);
    assert!(stored.context_json.contains("500"));

    let listed = state.adjustments.find_all(50, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
}
