//! Order tip ownership models
//!
//! An OwnershipRecord is the per-order snapshot of who owns the tip and
//! in what proportion, captured once at settlement time. Later changes
//! to ownership settings never alter already-settled orders; only the
//! adjustment engine can revise a record, and it does so with
//! correction entries rather than edits.

use serde::{Deserialize, Serialize};

/// Ownership resolution mode, snapshotted per order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum OwnershipMode {
    /// Split by each employee's item-level contribution to the subtotal
    #[cfg_attr(feature = "db", sqlx(rename = "item_based"))]
    ItemBased,
    /// The order's creator owns the whole tip; helpers are compensated
    /// later through tip-out rules only
    #[cfg_attr(feature = "db", sqlx(rename = "primary_server_owns_all"))]
    PrimaryServerOwnsAll,
}

/// Resolved tip ownership for a settled order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OwnershipRecord {
    pub order_id: i64,
    /// Mode actually applied (after the table/multi-owner gate)
    pub mode: OwnershipMode,
    pub tip_amount_cents: i64,
    pub subtotal_cents: i64,
    pub table_id: Option<i64>,
    pub creator_employee_id: i64,
    pub resolved_at: i64,
}

/// One owner's weight within an ownership record
///
/// `weight` is the owner's item-contribution basis (cents of subtotal
/// attributed to them); gross tip shares are allocated from these
/// weights. `position` is the deterministic remainder tie-break.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OwnershipOwner {
    pub order_id: i64,
    pub employee_id: i64,
    pub position: i64,
    pub weight: f64,
}

/// A settled item as reported by the order collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettledItem {
    pub item_id: i64,
    /// Line total in cents
    pub amount_cents: i64,
    /// Item-level seat/server assignment; several IDs = explicit co-ownership
    pub owner_employee_ids: Vec<i64>,
}

/// Order settlement event (consumed from the payment collaborator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSettlement {
    pub order_id: i64,
    pub tip_amount_cents: i64,
    pub subtotal_cents: i64,
    pub items: Vec<SettledItem>,
    pub table_id: Option<i64>,
    pub creator_employee_id: i64,
    /// Mode configured at settlement time
    pub ownership_mode: OwnershipMode,
    /// Settlement instant; defaults to now when absent (late delivery)
    pub settled_at: Option<i64>,
}
