//! Role fact mirror

use serde::{Deserialize, Serialize};

/// Role fact (read-only mirror)
///
/// `tip_weight` is the relative weight used by role-weighted tip splits
/// (e.g. head server 1.5, server 1.0, trainee 0.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub tip_weight: f64,
    pub active: bool,
}

/// Role fact upsert payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpsert {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_weight")]
    pub tip_weight: f64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_weight() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}
