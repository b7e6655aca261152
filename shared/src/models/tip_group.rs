//! Tip group and segment models (小费池)
//!
//! A group's membership history is an append-only sequence of segments:
//! a segment is a maximal interval during which membership is fixed. The
//! open segment (end_at = None) is the group's current composition;
//! every membership change closes it and opens a successor. Historical
//! splits are therefore reconstructible with a plain range scan.

use serde::{Deserialize, Serialize};

/// How a segment splits an incoming tip among its members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum SplitMode {
    /// 1/N per member
    #[cfg_attr(feature = "db", sqlx(rename = "equal"))]
    Equal,
    /// Proportional to hours worked during the segment
    #[cfg_attr(feature = "db", sqlx(rename = "hours_weighted"))]
    HoursWeighted,
    /// Proportional to the member's role tip-weight
    #[cfg_attr(feature = "db", sqlx(rename = "role_weighted"))]
    RoleWeighted,
}

/// Tip group status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum TipGroupStatus {
    #[cfg_attr(feature = "db", sqlx(rename = "active"))]
    Active,
    #[cfg_attr(feature = "db", sqlx(rename = "closed"))]
    Closed,
}

/// A pool of employees sharing tips for a period
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TipGroup {
    pub id: i64,
    /// Template that spawned this group at clock-in, if any
    pub template_id: Option<i64>,
    pub status: TipGroupStatus,
    pub created_at: i64,
    pub closed_at: Option<i64>,
}

/// A maximal interval of fixed group membership
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TipGroupSegment {
    pub id: i64,
    pub group_id: i64,
    pub start_at: i64,
    /// None = currently open
    pub end_at: Option<i64>,
    pub split_mode: SplitMode,
}

/// Segment membership row
///
/// `position` is join order within the segment and the deterministic
/// tie-break for remainder distribution. `weight` is the creation-time
/// weight snapshot: 1.0 for equal splits, the member's role tip-weight
/// for role-weighted splits. Hours-weighted segments read hour facts at
/// credit time instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SegmentMember {
    pub segment_id: i64,
    pub employee_id: i64,
    pub position: i64,
    pub weight: f64,
}

/// One credit_group invocation, recorded so adjustments can replay
/// historical group credits against corrected facts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct GroupCredit {
    pub id: i64,
    pub group_id: i64,
    pub order_id: Option<i64>,
    pub amount_cents: i64,
    pub credited_at: i64,
}

/// Create-group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipGroupCreate {
    pub template_id: Option<i64>,
    pub split_mode: SplitMode,
    pub initial_member_employee_id: i64,
}

/// Add-member payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipGroupAddMember {
    pub employee_id: i64,
}

/// One member's share within a historical segment (reporting view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberShare {
    pub employee_id: i64,
    pub weight: f64,
    /// Fraction of the segment's credits this member receives
    pub share: f64,
}

/// Segment with members, as returned by the group-history API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHistory {
    pub id: i64,
    pub group_id: i64,
    pub start_at: i64,
    pub end_at: Option<i64>,
    pub split_mode: SplitMode,
    pub members: Vec<MemberShare>,
}
