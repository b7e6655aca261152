//! Tip adjustment models
//!
//! A TipAdjustment is the audit record of a manager-initiated retroactive
//! correction. It owns the CORRECTION ledger entries it produced; the
//! original entries are never touched.

use serde::{Deserialize, Serialize};

/// What kind of historical fact an adjustment corrects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum AdjustmentType {
    /// Segment boundary move (who was pooled, and when)
    #[cfg_attr(feature = "db", sqlx(rename = "group_membership"))]
    GroupMembership,
    /// Revised owner weights for a settled order
    #[cfg_attr(feature = "db", sqlx(rename = "ownership_split"))]
    OwnershipSplit,
    /// Corrected hour facts for a segment
    #[cfg_attr(feature = "db", sqlx(rename = "clock_fix"))]
    ClockFix,
    /// Explicit per-employee deltas, no replay
    #[cfg_attr(feature = "db", sqlx(rename = "manual_override"))]
    ManualOverride,
    /// Corrected tip amount for a settled order
    #[cfg_attr(feature = "db", sqlx(rename = "tip_amount"))]
    TipAmount,
}

/// Audit record of a manual correction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TipAdjustment {
    pub id: i64,
    pub created_by_employee_id: i64,
    pub reason: String,
    pub adjustment_type: AdjustmentType,
    /// Before/after snapshot of the corrected facts (JSON)
    pub context_json: String,
    pub created_at: i64,
    pub auto_recalc_ran: bool,
}

/// Target + new facts for one adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "adjustment_type", rename_all = "snake_case")]
pub enum AdjustmentCommand {
    /// Move a segment boundary. The neighbouring segment's opposite
    /// boundary moves with it so segments stay gap-free.
    GroupMembership {
        group_id: i64,
        segment_id: i64,
        new_start_at: Option<i64>,
        new_end_at: Option<i64>,
    },
    /// Replace the owner weights of a settled order
    OwnershipSplit {
        order_id: i64,
        owners: Vec<OwnerWeight>,
    },
    /// Replace hour facts for one employee in one segment
    ClockFix {
        segment_id: i64,
        employee_id: i64,
        hours: f64,
    },
    /// Post explicit deltas with no replay
    ManualOverride { deltas: Vec<EmployeeDelta> },
    /// Correct the tip amount of a settled order
    TipAmount { order_id: i64, tip_amount_cents: i64 },
}

impl AdjustmentCommand {
    pub fn adjustment_type(&self) -> AdjustmentType {
        match self {
            Self::GroupMembership { .. } => AdjustmentType::GroupMembership,
            Self::OwnershipSplit { .. } => AdjustmentType::OwnershipSplit,
            Self::ClockFix { .. } => AdjustmentType::ClockFix,
            Self::ManualOverride { .. } => AdjustmentType::ManualOverride,
            Self::TipAmount { .. } => AdjustmentType::TipAmount,
        }
    }
}

/// Owner weight replacement within an ownership-split adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerWeight {
    pub employee_id: i64,
    pub weight: f64,
}

/// Explicit per-employee delta for a manual override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeDelta {
    pub employee_id: i64,
    pub amount_cents: i64,
}

/// Manager adjustment request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub reason: String,
    pub created_by_employee_id: i64,
    #[serde(flatten)]
    pub command: AdjustmentCommand,
}

/// Adjustment result returned to the manager UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentResult {
    pub adjustment: TipAdjustment,
    /// Net correction per employee, for the confirmation screen
    pub corrections: Vec<EmployeeDelta>,
}
