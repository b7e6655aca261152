//! Ledger entry model (小费账本)
//!
//! The ledger is the single source of truth for tip balances. Entries are
//! append-only: no update or delete exists anywhere in the public contract.
//! A correction is always a new entry.

use serde::{Deserialize, Serialize};

/// Ledger entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum EntryType {
    /// Tip credited directly from an order settlement
    #[cfg_attr(feature = "db", sqlx(rename = "DIRECT_TIP"))]
    DirectTip,
    /// Share of a tip routed through a tip group segment
    #[cfg_attr(feature = "db", sqlx(rename = "GROUP_SHARE"))]
    GroupShare,
    /// Debit posted against a giver by a tip-out rule at shift close
    #[cfg_attr(feature = "db", sqlx(rename = "TIPOUT_DEBIT"))]
    TipoutDebit,
    /// Credit posted to a receiver by a tip-out rule at shift close
    #[cfg_attr(feature = "db", sqlx(rename = "TIPOUT_CREDIT"))]
    TipoutCredit,
    /// Cash paid out to the employee (negative amount)
    #[cfg_attr(feature = "db", sqlx(rename = "PAYOUT_CASH"))]
    PayoutCash,
    /// Delta entry produced by a retroactive adjustment
    #[cfg_attr(feature = "db", sqlx(rename = "CORRECTION"))]
    Correction,
}

/// Immutable ledger entry
///
/// An employee's balance at any time is the sum of all their entries with
/// `created_at` at or before that time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: i64,
    pub employee_id: i64,
    /// Signed amount in minor currency units (cents)
    pub amount_cents: i64,
    pub entry_type: EntryType,
    /// Order that produced this entry, if any
    pub reference_order_id: Option<i64>,
    /// Tip group that routed this entry, if any
    pub reference_group_id: Option<i64>,
    /// Adjustment that produced this entry (CORRECTION only)
    pub reference_adjustment_id: Option<i64>,
    /// Unique per originating event; makes appends retry-safe
    pub idempotency_key: String,
    pub created_at: i64,
}

/// New entry payload (id and created_at assigned at append time)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub employee_id: i64,
    pub amount_cents: i64,
    pub entry_type: EntryType,
    pub reference_order_id: Option<i64>,
    pub reference_group_id: Option<i64>,
    pub reference_adjustment_id: Option<i64>,
    pub idempotency_key: String,
}

impl NewLedgerEntry {
    /// Minimal constructor; reference fields default to none
    pub fn new(
        employee_id: i64,
        amount_cents: i64,
        entry_type: EntryType,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            employee_id,
            amount_cents,
            entry_type,
            reference_order_id: None,
            reference_group_id: None,
            reference_adjustment_id: None,
            idempotency_key: idempotency_key.into(),
        }
    }

    pub fn with_order(mut self, order_id: i64) -> Self {
        self.reference_order_id = Some(order_id);
        self
    }

    pub fn with_group(mut self, group_id: i64) -> Self {
        self.reference_group_id = Some(group_id);
        self
    }

    pub fn with_adjustment(mut self, adjustment_id: i64) -> Self {
        self.reference_adjustment_id = Some(adjustment_id);
        self
    }
}

/// Cash payout request (manager records a drawer payout)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    /// Positive amount being paid out; posted as a negative PAYOUT_CASH entry
    pub amount_cents: i64,
    pub recorded_by_employee_id: i64,
    /// Client-generated payout id, used for the idempotency key
    pub payout_id: i64,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&EntryType::DirectTip).unwrap(),
            "\"DIRECT_TIP\""
        );
        assert_eq!(
            serde_json::to_string(&EntryType::TipoutDebit).unwrap(),
            "\"TIPOUT_DEBIT\""
        );
        let t: EntryType = serde_json::from_str("\"GROUP_SHARE\"").unwrap();
        assert_eq!(t, EntryType::GroupShare);
    }

    #[test]
    fn new_entry_builder_sets_references() {
        let entry = NewLedgerEntry::new(7, 500, EntryType::GroupShare, "settle:1:7")
            .with_order(1)
            .with_group(3);
        assert_eq!(entry.reference_order_id, Some(1));
        assert_eq!(entry.reference_group_id, Some(3));
        assert!(entry.reference_adjustment_id.is_none());
    }
}
