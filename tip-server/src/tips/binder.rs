//! Template / clock-in binder
//!
//! Maps a clock-in's template selection to a runtime tip group. The
//! clock-in transaction commits first; pooling assignment runs afterward
//! in its own unit of work, and its failure never rolls back or blocks
//! the clock-in — a manager can fix a missed assignment later with an
//! adjustment.

use super::error::{TipError, TipResult};
use super::groups::GroupEngine;
use crate::db::repository::{employee as employee_repo, shift as shift_repo, template as template_repo};
use shared::models::{ClockInEvent, ClockInOutcome, TipGroupTemplate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

/// Find-or-create retries when concurrent clock-ins race on one template
const ASSIGN_RETRIES: usize = 2;

/// Template/clock-in binder
#[derive(Clone)]
pub struct TemplateBinder {
    pool: SqlitePool,
    groups: GroupEngine,
}

impl TemplateBinder {
    pub fn new(pool: SqlitePool, groups: GroupEngine) -> Self {
        Self { pool, groups }
    }

    /// Active templates whose allowed roles include `role_id`
    pub async fn eligible_templates(&self, role_id: i64) -> TipResult<Vec<TipGroupTemplate>> {
        let templates = template_repo::find_active(&self.pool).await?;
        Ok(templates
            .into_iter()
            .filter(|t| t.allows_role(role_id))
            .collect())
    }

    /// Record the clock-in, then attempt the pooling assignment.
    ///
    /// Two-phase by design: the shift fact commits in its own
    /// transaction before any pooling work starts, so a pooling failure
    /// (AlreadyInGroup, template race, anything) is logged and reported
    /// but can never fail the clock-in itself.
    pub async fn clock_in(&self, event: &ClockInEvent) -> TipResult<ClockInOutcome> {
        let at = event.at.unwrap_or_else(now_millis);
        let shift_id = snowflake_id();

        let mut tx = self.pool.begin().await?;
        employee_repo::find_employee(&mut tx, event.employee_id)
            .await?
            .ok_or(TipError::EmployeeNotFound(event.employee_id))?;
        shift_repo::insert_shift(&mut tx, shift_id, event.employee_id, event.role_id, at).await?;
        tx.commit().await?;

        let mut outcome = ClockInOutcome {
            shift_id,
            group_id: None,
            pooling_error: None,
        };

        if let Some(template_id) = event.selected_template_id {
            match self.assign_to_template(event.employee_id, template_id).await {
                Ok(group_id) => outcome.group_id = Some(group_id),
                Err(e) => {
                    tracing::warn!(
                        employee_id = event.employee_id,
                        template_id,
                        error = %e,
                        "Pooling assignment failed, clock-in unaffected"
                    );
                    outcome.pooling_error = Some(e.to_string());
                }
            }
        }
        Ok(outcome)
    }

    /// Find the template's active runtime group (or create one) and add
    /// the employee to it
    pub async fn assign_to_template(&self, employee_id: i64, template_id: i64) -> TipResult<i64> {
        let template = template_repo::find_by_id_pool(&self.pool, template_id)
            .await?
            .ok_or(TipError::TemplateNotFound(template_id))?;
        if !template.active {
            return Err(TipError::TemplateInactive(template_id));
        }

        {
            let mut conn = self.pool.acquire().await?;
            let employee = employee_repo::find_employee(&mut conn, employee_id)
                .await?
                .ok_or(TipError::EmployeeNotFound(employee_id))?;
            if !template.allows_role(employee.role_id) {
                return Err(TipError::RoleNotEligible {
                    employee_id,
                    template_id,
                });
            }
        }

        let mut last_err = TipError::SegmentLockConflict(0);
        for _ in 0..=ASSIGN_RETRIES {
            let existing = {
                let mut conn = self.pool.acquire().await?;
                crate::db::repository::tip_group::find_active_by_template(&mut conn, template_id)
                    .await?
            };

            match existing {
                Some(group) => match self.groups.add_member(group.id, employee_id).await {
                    Ok(_) => return Ok(group.id),
                    // Another clock-in closed the group between the find
                    // and the add; retry the find-or-create
                    Err(TipError::GroupClosed(_)) | Err(TipError::SegmentLockConflict(_)) => {
                        last_err = TipError::SegmentLockConflict(group.id);
                    }
                    Err(e) => return Err(e),
                },
                None => {
                    match self
                        .groups
                        .create_group(
                            Some(template_id),
                            template.default_split_mode,
                            employee_id,
                        )
                        .await
                    {
                        Ok(group_id) => return Ok(group_id),
                        // The one-active-group-per-template index fired:
                        // a concurrent clock-in created it first
                        Err(TipError::Repo(crate::db::repository::RepoError::Duplicate(_))) => {
                            last_err = TipError::SegmentLockConflict(0);
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        Err(last_err)
    }
}
