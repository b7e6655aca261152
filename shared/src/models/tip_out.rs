//! Tip-out rule model
//!
//! Role-pair redistribution applied at shift close (e.g. server tips out
//! 3% of gross tips to bussers).

use serde::{Deserialize, Serialize};

/// Basis a tip-out percentage is computed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum TipOutBasis {
    /// The giver's DIRECT_TIP + GROUP_SHARE credits for the shift
    #[cfg_attr(feature = "db", sqlx(rename = "gross_tips"))]
    GrossTips,
    /// The giver's net sales for the shift (reported at shift close)
    #[cfg_attr(feature = "db", sqlx(rename = "net_sales"))]
    NetSales,
}

/// Role-pair tip-out rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TipOutRule {
    pub id: i64,
    pub giver_role_id: i64,
    pub receiver_role_id: i64,
    /// Percentage in [0, 100]
    pub percent: f64,
    pub basis: TipOutBasis,
    pub active: bool,
}

/// Rule upsert payload (pushed by the admin collaborator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipOutRuleUpsert {
    pub id: i64,
    pub giver_role_id: i64,
    pub receiver_role_id: i64,
    pub percent: f64,
    pub basis: TipOutBasis,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}
