//! Fact mirror handlers
//!
//! Batch upserts pushed by the staff-management and admin collaborators.
//! Each batch lands in one transaction.

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::db::repository::{employee as employee_repo, tip_out_rule as rule_repo};
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{EmployeeUpsert, RoleUpsert, TipOutRuleUpsert};

/// POST /api/facts/roles - 角色事实批量同步
pub async fn upsert_roles(
    State(state): State<ServerState>,
    Json(payload): Json<Vec<RoleUpsert>>,
) -> AppResult<Json<usize>> {
    for role in &payload {
        validate_required_text(&role.name, "name", MAX_NAME_LEN)?;
        if !role.tip_weight.is_finite() || role.tip_weight < 0.0 {
            return Err(AppError::validation(format!(
                "tip_weight must be non-negative, got {}",
                role.tip_weight
            )));
        }
    }

    let mut tx = state.pool.begin().await.map_err(|e| AppError::database(e.to_string()))?;
    for role in &payload {
        employee_repo::upsert_role(&mut tx, role).await?;
    }
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(payload.len()))
}

/// POST /api/facts/employees - 员工事实批量同步
pub async fn upsert_employees(
    State(state): State<ServerState>,
    Json(payload): Json<Vec<EmployeeUpsert>>,
) -> AppResult<Json<usize>> {
    for employee in &payload {
        validate_required_text(&employee.name, "name", MAX_NAME_LEN)?;
    }

    let mut tx = state.pool.begin().await.map_err(|e| AppError::database(e.to_string()))?;
    for employee in &payload {
        employee_repo::upsert_employee(&mut tx, employee).await?;
    }
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(payload.len()))
}

/// POST /api/facts/tip-out-rules - 分出规则批量同步
pub async fn upsert_tip_out_rules(
    State(state): State<ServerState>,
    Json(payload): Json<Vec<TipOutRuleUpsert>>,
) -> AppResult<Json<usize>> {
    let mut tx = state.pool.begin().await.map_err(|e| AppError::database(e.to_string()))?;
    for rule in &payload {
        rule_repo::upsert(&mut tx, rule).await?;
    }
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(payload.len()))
}
