//! Employee fact mirror
//!
//! Employees are owned by the staff-management collaborator; the tip
//! ledger keeps a read-only mirror for role lookups and display names.

use serde::{Deserialize, Serialize};

/// Employee fact (read-only mirror)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: i64,
    pub name: String,
    /// Role reference
    pub role_id: i64,
    pub active: bool,
}

/// Employee fact upsert payload (pushed by the staff collaborator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeUpsert {
    pub id: i64,
    pub name: String,
    pub role_id: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}
