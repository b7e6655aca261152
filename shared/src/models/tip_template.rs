//! Tip group template model
//!
//! Admin-authored patterns for runtime tip groups. A template backs at
//! most one active group at a time; clock-in finds or creates it.

use super::tip_group::SplitMode;
use serde::{Deserialize, Serialize};

/// Tip group template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TipGroupTemplate {
    pub id: i64,
    pub name: String,
    /// JSON array of role IDs allowed to join; empty = all roles
    #[cfg_attr(feature = "db", sqlx(json))]
    pub allowed_role_ids: Vec<i64>,
    pub default_split_mode: SplitMode,
    pub active: bool,
    pub created_at: i64,
}

impl TipGroupTemplate {
    /// Whether employees holding `role_id` may join groups of this template
    pub fn allows_role(&self, role_id: i64) -> bool {
        self.allowed_role_ids.is_empty() || self.allowed_role_ids.contains(&role_id)
    }
}

/// Create template payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCreate {
    pub name: String,
    #[serde(default)]
    pub allowed_role_ids: Vec<i64>,
    pub default_split_mode: SplitMode,
}

/// Update template payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub allowed_role_ids: Option<Vec<i64>>,
    pub default_split_mode: Option<SplitMode>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(allowed: Vec<i64>) -> TipGroupTemplate {
        TipGroupTemplate {
            id: 1,
            name: "Floor pool".into(),
            allowed_role_ids: allowed,
            default_split_mode: SplitMode::Equal,
            active: true,
            created_at: 0,
        }
    }

    #[test]
    fn empty_allowed_roles_means_all() {
        assert!(template(vec![]).allows_role(99));
    }

    #[test]
    fn allowed_roles_filter() {
        let t = template(vec![10, 11]);
        assert!(t.allows_role(10));
        assert!(!t.allows_role(12));
    }
}
