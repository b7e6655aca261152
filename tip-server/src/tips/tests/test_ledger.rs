use super::*;
use crate::db::repository::ledger as ledger_repo;
use shared::models::{EntryType, NewLedgerEntry, PayoutRequest};
use shared::util::now_millis;

fn payout(payout_id: i64, amount_cents: i64) -> PayoutRequest {
    PayoutRequest {
        amount_cents,
        recorded_by_employee_id: EVA,
        payout_id,
        note: None,
    }
}

#[tokio::test]
async fn payout_posts_negative_entry() {
    let state = test_state().await;

    let entry = state.ledger.record_payout(ANA, &payout(1, 2500)).await.unwrap();
    assert_eq!(entry.amount_cents, -2500);
    assert_eq!(entry.entry_type, EntryType::PayoutCash);

    let balance = state.ledger.balance_as_of(ANA, None).await.unwrap();
    assert_eq!(balance, -2500);
}

#[tokio::test]
async fn payout_is_idempotent_per_payout_id() {
    let state = test_state().await;

    let first = state.ledger.record_payout(ANA, &payout(7, 1000)).await.unwrap();
    let second = state.ledger.record_payout(ANA, &payout(7, 1000)).await.unwrap();
    assert_eq!(first.id, second.id);

    // Exactly one ledger effect
    let balance = state.ledger.balance_as_of(ANA, None).await.unwrap();
    assert_eq!(balance, -1000);
}

#[tokio::test]
async fn payout_rejects_non_positive_amounts() {
    let state = test_state().await;
    assert!(state.ledger.record_payout(ANA, &payout(1, 0)).await.is_err());
    assert!(state.ledger.record_payout(ANA, &payout(2, -500)).await.is_err());
}

#[tokio::test]
async fn balance_reconstruction_sums_all_entry_types() {
    let state = test_state().await;
    let base = now_millis() - 10_000;

    // Mixed entry types appended at controlled instants
    let mut conn = state.pool.acquire().await.unwrap();
    let entries = [
        (1000, EntryType::DirectTip, "t1"),
        (500, EntryType::GroupShare, "t2"),
        (-150, EntryType::TipoutDebit, "t3"),
        (75, EntryType::TipoutCredit, "t4"),
        (-200, EntryType::Correction, "t5"),
    ];
    for (i, (amount, entry_type, key)) in entries.iter().enumerate() {
        ledger_repo::append(
            &mut conn,
            &NewLedgerEntry::new(ANA, *amount, *entry_type, *key),
            base + i as i64 * 1000,
        )
        .await
        .unwrap();
    }
    drop(conn);

    // Balance as of "now" is the sum of everything
    let balance = state.ledger.balance_as_of(ANA, None).await.unwrap();
    assert_eq!(balance, 1000 + 500 - 150 + 75 - 200);

    // Balance as of an earlier instant excludes later entries
    let early = state
        .ledger
        .balance_as_of(ANA, Some(base + 1500))
        .await
        .unwrap();
    assert_eq!(early, 1000 + 500);
}

#[tokio::test]
async fn entries_view_filters_by_type() {
    let state = test_state().await;
    let now = now_millis();

    let mut conn = state.pool.acquire().await.unwrap();
    ledger_repo::append(
        &mut conn,
        &NewLedgerEntry::new(ANA, 1000, EntryType::DirectTip, "d1"),
        now,
    )
    .await
    .unwrap();
    ledger_repo::append(
        &mut conn,
        &NewLedgerEntry::new(ANA, 500, EntryType::GroupShare, "g1"),
        now,
    )
    .await
    .unwrap();
    drop(conn);

    let all = state
        .ledger
        .entries(ANA, 0, now + 1, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let direct = state
        .ledger
        .entries(ANA, 0, now + 1, Some(EntryType::DirectTip))
        .await
        .unwrap();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].amount_cents, 1000);
}

#[tokio::test]
async fn duplicate_idempotency_key_is_single_effect() {
    let state = test_state().await;
    let now = now_millis();

    let mut conn = state.pool.acquire().await.unwrap();
    let first = ledger_repo::append(
        &mut conn,
        &NewLedgerEntry::new(BEN, 750, EntryType::DirectTip, "settle:42:200"),
        now,
    )
    .await
    .unwrap();
    assert!(!first.duplicate);

    let retry = ledger_repo::append(
        &mut conn,
        &NewLedgerEntry::new(BEN, 750, EntryType::DirectTip, "settle:42:200"),
        now + 5,
    )
    .await
    .unwrap();
    assert!(retry.duplicate);
    assert_eq!(retry.entry_id, first.entry_id);
    drop(conn);

    let balance = state.ledger.balance_as_of(BEN, None).await.unwrap();
    assert_eq!(balance, 750);
}
