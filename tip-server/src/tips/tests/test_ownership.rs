use super::*;
use shared::models::{EntryType, SplitMode};

#[tokio::test]
async fn item_based_settlement_credits_proportional_shares() {
    let state = test_state().await;

    // 70/30 contribution on a $20.00 tip → $14.00 / $6.00
    let entries = state
        .resolver
        .settle_order(&split_settlement(1, 2000, ANA, BEN, OwnershipMode::ItemBased, Some(4)))
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    let by_employee: Vec<(i64, i64)> =
        entries.iter().map(|e| (e.employee_id, e.amount_cents)).collect();
    assert!(by_employee.contains(&(ANA, 1400)));
    assert!(by_employee.contains(&(BEN, 600)));
    assert!(entries.iter().all(|e| e.entry_type == EntryType::DirectTip));
    assert!(entries.iter().all(|e| e.reference_order_id == Some(1)));
}

#[tokio::test]
async fn primary_server_mode_routes_everything_to_creator() {
    let state = test_state().await;

    // Same 70/30 order, mode flipped, table set → creator takes 100%
    let entries = state
        .resolver
        .settle_order(&split_settlement(
            2,
            2000,
            ANA,
            BEN,
            OwnershipMode::PrimaryServerOwnsAll,
            Some(4),
        ))
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].employee_id, ANA);
    assert_eq!(entries[0].amount_cents, 2000);

    let ben_balance = state.ledger.balance_as_of(BEN, None).await.unwrap();
    assert_eq!(ben_balance, 0);

    let (record, owners) = state.resolver.record_of(2).await.unwrap();
    assert_eq!(record.mode, OwnershipMode::PrimaryServerOwnsAll);
    assert_eq!(owners.len(), 1);
}

#[tokio::test]
async fn primary_server_mode_needs_a_table() {
    let state = test_state().await;

    // No table → per-item resolution applies even under the flipped mode
    let entries = state
        .resolver
        .settle_order(&split_settlement(
            3,
            2000,
            ANA,
            BEN,
            OwnershipMode::PrimaryServerOwnsAll,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn settlement_routes_pooled_owner_through_their_group() {
    let state = test_state().await;

    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();

    let entries = state
        .resolver
        .settle_order(&simple_settlement(4, 1000, ANA))
        .await
        .unwrap();

    // Ana's 100% share went through the pool: one GROUP_SHARE per member
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.entry_type == EntryType::GroupShare));
    assert!(entries.iter().all(|e| e.reference_group_id == Some(group_id)));
    assert_eq!(entries.iter().map(|e| e.amount_cents).sum::<i64>(), 1000);
}

#[tokio::test]
async fn co_owners_in_the_same_group_get_one_combined_credit() {
    let state = test_state().await;

    let group_id = state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();
    state.groups.add_member(group_id, BEN).await.unwrap();

    // Both owners are pooled together: their 70/30 shares combine into
    // a single group credit, split equally by the segment
    let entries = state
        .resolver
        .settle_order(&split_settlement(9, 2000, ANA, BEN, OwnershipMode::ItemBased, None))
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.entry_type == EntryType::GroupShare));
    assert!(entries.iter().all(|e| e.amount_cents == 1000));
    assert_eq!(entries.iter().map(|e| e.amount_cents).sum::<i64>(), 2000);
}

#[tokio::test]
async fn settlement_is_idempotent_per_order() {
    let state = test_state().await;

    let settlement = simple_settlement(5, 1500, ANA);
    let first = state.resolver.settle_order(&settlement).await.unwrap();
    let second = state.resolver.settle_order(&settlement).await.unwrap();

    assert_eq!(first.len(), second.len());
    let balance = state.ledger.balance_as_of(ANA, None).await.unwrap();
    assert_eq!(balance, 1500);
}

#[tokio::test]
async fn zero_tip_settlement_records_ownership_without_entries() {
    let state = test_state().await;

    let entries = state
        .resolver
        .settle_order(&simple_settlement(6, 0, ANA))
        .await
        .unwrap();
    assert!(entries.is_empty());

    let (record, owners) = state.resolver.record_of(6).await.unwrap();
    assert_eq!(record.tip_amount_cents, 0);
    assert_eq!(owners.len(), 1);
}

#[tokio::test]
async fn negative_tip_is_rejected() {
    let state = test_state().await;
    let result = state
        .resolver
        .settle_order(&simple_settlement(7, -100, ANA))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn co_owned_items_share_contribution_evenly() {
    let state = test_state().await;

    let settlement = OrderSettlement {
        order_id: 8,
        tip_amount_cents: 900,
        subtotal_cents: 9_000,
        items: vec![SettledItem {
            item_id: 1,
            amount_cents: 9_000,
            owner_employee_ids: vec![ANA, BEN, CARLA],
        }],
        table_id: None,
        creator_employee_id: ANA,
        ownership_mode: OwnershipMode::ItemBased,
        settled_at: None,
    };
    let entries = state.resolver.settle_order(&settlement).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.amount_cents == 300));
}
