//! Shift and time-clock fact models (班次)
//!
//! Shifts are owned by the time-clock collaborator; the tip ledger keeps
//! the window facts it needs to scope tip-outs and hour-weighted splits.

use serde::{Deserialize, Serialize};

/// Shift window fact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Shift {
    pub id: i64,
    pub employee_id: i64,
    pub role_id: i64,
    pub start_at: i64,
    /// None while the shift is open
    pub end_at: Option<i64>,
    /// Net sales for the shift, reported at close (net_sales tip-out basis)
    pub net_sales_cents: Option<i64>,
}

/// Clock-in event (consumed from the time-clock collaborator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockInEvent {
    pub employee_id: i64,
    pub role_id: i64,
    /// Pool template chosen on the clock-in screen, if any
    pub selected_template_id: Option<i64>,
    /// Clock-in instant; defaults to now when absent
    pub at: Option<i64>,
}

/// Outcome of a clock-in, including the best-effort pooling result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockInOutcome {
    pub shift_id: i64,
    /// Group the employee was pooled into, when assignment succeeded
    pub group_id: Option<i64>,
    /// Present when pooling assignment was attempted and failed;
    /// clock-in itself still succeeded
    pub pooling_error: Option<String>,
}

/// Shift-close event (consumed from the time-clock collaborator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftCloseEvent {
    pub employee_id: i64,
    pub shift_id: i64,
    pub net_sales_cents: Option<i64>,
    /// Close instant; defaults to now when absent
    pub at: Option<i64>,
}

/// Hours-worked fact for one employee within one segment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SegmentHours {
    pub segment_id: i64,
    pub employee_id: i64,
    pub hours: f64,
}

/// Batch of hour facts pushed by the time-clock collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHoursEvent {
    pub segment_id: i64,
    pub entries: Vec<SegmentHoursEntry>,
}

/// One employee's hours within the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHoursEntry {
    pub employee_id: i64,
    pub hours: f64,
}
