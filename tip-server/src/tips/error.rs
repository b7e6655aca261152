//! Tip engine error types

use crate::db::repository::RepoError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Errors produced by the tip engines
///
/// Anything touching a ledger append or an adjustment propagates; silent
/// tip loss is a correctness bug, not a UX nuisance. The one deliberate
/// swallow lives at the clock-in boundary in the template binder.
#[derive(Debug, Error)]
pub enum TipError {
    #[error("Tip group {0} not found")]
    GroupNotFound(i64),

    #[error("Tip group {0} is closed")]
    GroupClosed(i64),

    #[error("Employee {employee_id} is already active in tip group {group_id}")]
    AlreadyInGroup { employee_id: i64, group_id: i64 },

    #[error("Employee {employee_id} is not a member of tip group {group_id}")]
    NotAGroupMember { employee_id: i64, group_id: i64 },

    #[error("Concurrent segment transition on tip group {0}, retry")]
    SegmentLockConflict(i64),

    #[error("Segment {0} not found")]
    SegmentNotFound(i64),

    #[error("No segment of tip group {group_id} covers instant {at}")]
    NoSegmentForInstant { group_id: i64, at: i64 },

    #[error("Template {0} not found")]
    TemplateNotFound(i64),

    #[error("Template {0} is inactive")]
    TemplateInactive(i64),

    #[error("Employee {employee_id} role is not eligible for template {template_id}")]
    RoleNotEligible { employee_id: i64, template_id: i64 },

    #[error("Employee {0} not found")]
    EmployeeNotFound(i64),

    #[error("Shift {0} not found")]
    ShiftNotFound(i64),

    #[error("Order {0} has no settlement on record")]
    OrderNotSettled(i64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Shares failed to sum back to the input amount. Always a bug;
    /// fails the whole unit of work rather than dropping currency.
    #[error("Allocated {allocated} cents from an input of {input} cents")]
    RoundingResidual { input: i64, allocated: i64 },

    #[error("Adjustment failed: {0}")]
    AdjustmentFailed(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Result type for tip engine operations
pub type TipResult<T> = Result<T, TipError>;

impl From<sqlx::Error> for TipError {
    fn from(err: sqlx::Error) -> Self {
        TipError::Repo(RepoError::from(err))
    }
}

impl From<TipError> for AppError {
    fn from(err: TipError) -> Self {
        let message = err.to_string();
        let code = match &err {
            TipError::GroupNotFound(_) => ErrorCode::GroupNotFound,
            TipError::GroupClosed(_) => ErrorCode::GroupClosed,
            TipError::AlreadyInGroup { .. } => ErrorCode::AlreadyInGroup,
            TipError::NotAGroupMember { .. } => ErrorCode::NotAGroupMember,
            TipError::SegmentLockConflict(_) => ErrorCode::SegmentLockConflict,
            TipError::SegmentNotFound(_) | TipError::NoSegmentForInstant { .. } => {
                ErrorCode::SegmentNotFound
            }
            TipError::TemplateNotFound(_) => ErrorCode::TemplateNotFound,
            TipError::TemplateInactive(_) => ErrorCode::TemplateInactive,
            TipError::RoleNotEligible { .. } => ErrorCode::ValidationFailed,
            TipError::EmployeeNotFound(_) => ErrorCode::EmployeeNotFound,
            TipError::ShiftNotFound(_) => ErrorCode::ShiftNotFound,
            TipError::OrderNotSettled(_) => ErrorCode::OrderNotSettled,
            TipError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            TipError::RoundingResidual { .. } => ErrorCode::RoundingResidual,
            TipError::AdjustmentFailed(_) => ErrorCode::AdjustmentFailed,
            TipError::Repo(repo) => match repo {
                RepoError::NotFound(_) => ErrorCode::NotFound,
                RepoError::Duplicate(_) => ErrorCode::AlreadyExists,
                RepoError::Validation(_) => ErrorCode::ValidationFailed,
                RepoError::Database(_) => ErrorCode::DatabaseError,
            },
        };
        AppError::with_message(code, message)
    }
}
