//! Unified error codes for the tip ledger platform
//!
//! This module defines all error codes used across tip-server and frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 2xxx: Permission errors
//! - 4xxx: Ledger errors
//! - 5xxx: Tip group errors
//! - 6xxx: Adjustment errors
//! - 8xxx: Employee/shift errors
//! - 9xxx: System errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 4xxx: Ledger ====================
    /// An entry with the same idempotency key already exists
    DuplicateIdempotencyKey = 4001,
    /// Computed shares do not sum to the input amount
    RoundingResidual = 4002,
    /// Amount is invalid (zero, negative where positive required, overflow)
    InvalidAmount = 4003,
    /// Ledger entry not found
    LedgerEntryNotFound = 4004,

    // ==================== 5xxx: Tip group ====================
    /// Tip group not found
    GroupNotFound = 5001,
    /// Tip group is already closed
    GroupClosed = 5002,
    /// Employee is already an active member of a tip group
    AlreadyInGroup = 5003,
    /// Employee is not a member of this tip group
    NotAGroupMember = 5004,
    /// Concurrent segment transition conflict, retry
    SegmentLockConflict = 5005,
    /// Tip group template not found
    TemplateNotFound = 5006,
    /// Tip group template is inactive
    TemplateInactive = 5007,
    /// Segment not found
    SegmentNotFound = 5008,

    // ==================== 6xxx: Adjustment ====================
    /// Adjustment unit of work rolled back
    AdjustmentFailed = 6001,
    /// Adjustment request is invalid for its target
    InvalidAdjustment = 6002,
    /// Adjustment not found
    AdjustmentNotFound = 6003,

    // ==================== 8xxx: Employee/shift ====================
    /// Employee not found
    EmployeeNotFound = 8001,
    /// Role not found
    RoleNotFound = 8101,
    /// Shift not found
    ShiftNotFound = 8201,
    /// Shift is already closed
    ShiftAlreadyClosed = 8202,
    /// Order settlement not found
    OrderNotSettled = 8301,
    /// Order has already been settled
    OrderAlreadySettled = 8302,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            // General
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            // Permission
            Self::PermissionDenied => "Permission denied",

            // Ledger
            Self::DuplicateIdempotencyKey => "Entry with this idempotency key already exists",
            Self::RoundingResidual => "Computed shares do not sum to the input amount",
            Self::InvalidAmount => "Invalid amount",
            Self::LedgerEntryNotFound => "Ledger entry not found",

            // Tip group
            Self::GroupNotFound => "Tip group not found",
            Self::GroupClosed => "Tip group is closed",
            Self::AlreadyInGroup => "Employee is already in an active tip group",
            Self::NotAGroupMember => "Employee is not a member of this tip group",
            Self::SegmentLockConflict => "Concurrent segment transition, retry",
            Self::TemplateNotFound => "Tip group template not found",
            Self::TemplateInactive => "Tip group template is inactive",
            Self::SegmentNotFound => "Segment not found",

            // Adjustment
            Self::AdjustmentFailed => "Adjustment failed and was rolled back",
            Self::InvalidAdjustment => "Invalid adjustment request",
            Self::AdjustmentNotFound => "Adjustment not found",

            // Employee/shift
            Self::EmployeeNotFound => "Employee not found",
            Self::RoleNotFound => "Role not found",
            Self::ShiftNotFound => "Shift not found",
            Self::ShiftAlreadyClosed => "Shift is already closed",
            Self::OrderNotSettled => "Order settlement not found",
            Self::OrderAlreadySettled => "Order has already been settled",

            // System
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
        }
    }

    /// Get the HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::ValidationFailed | Self::InvalidRequest | Self::InvalidAmount => {
                StatusCode::BAD_REQUEST
            }

            Self::PermissionDenied => StatusCode::FORBIDDEN,

            Self::NotFound
            | Self::LedgerEntryNotFound
            | Self::GroupNotFound
            | Self::TemplateNotFound
            | Self::SegmentNotFound
            | Self::AdjustmentNotFound
            | Self::EmployeeNotFound
            | Self::RoleNotFound
            | Self::ShiftNotFound
            | Self::OrderNotSettled => StatusCode::NOT_FOUND,

            Self::AlreadyExists
            | Self::DuplicateIdempotencyKey
            | Self::AlreadyInGroup
            | Self::SegmentLockConflict
            | Self::OrderAlreadySettled => StatusCode::CONFLICT,

            Self::GroupClosed
            | Self::NotAGroupMember
            | Self::TemplateInactive
            | Self::ShiftAlreadyClosed
            | Self::InvalidAdjustment => StatusCode::UNPROCESSABLE_ENTITY,

            Self::AdjustmentFailed
            | Self::RoundingResidual
            | Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Ledger
            4001 => Ok(ErrorCode::DuplicateIdempotencyKey),
            4002 => Ok(ErrorCode::RoundingResidual),
            4003 => Ok(ErrorCode::InvalidAmount),
            4004 => Ok(ErrorCode::LedgerEntryNotFound),

            // Tip group
            5001 => Ok(ErrorCode::GroupNotFound),
            5002 => Ok(ErrorCode::GroupClosed),
            5003 => Ok(ErrorCode::AlreadyInGroup),
            5004 => Ok(ErrorCode::NotAGroupMember),
            5005 => Ok(ErrorCode::SegmentLockConflict),
            5006 => Ok(ErrorCode::TemplateNotFound),
            5007 => Ok(ErrorCode::TemplateInactive),
            5008 => Ok(ErrorCode::SegmentNotFound),

            // Adjustment
            6001 => Ok(ErrorCode::AdjustmentFailed),
            6002 => Ok(ErrorCode::InvalidAdjustment),
            6003 => Ok(ErrorCode::AdjustmentNotFound),

            // Employee/shift
            8001 => Ok(ErrorCode::EmployeeNotFound),
            8101 => Ok(ErrorCode::RoleNotFound),
            8201 => Ok(ErrorCode::ShiftNotFound),
            8202 => Ok(ErrorCode::ShiftAlreadyClosed),
            8301 => Ok(ErrorCode::OrderNotSettled),
            8302 => Ok(ErrorCode::OrderAlreadySettled),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        // General
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::Unknown.code(), 1);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::AlreadyExists.code(), 4);

        // Domain
        assert_eq!(ErrorCode::DuplicateIdempotencyKey.code(), 4001);
        assert_eq!(ErrorCode::AlreadyInGroup.code(), 5003);
        assert_eq!(ErrorCode::SegmentLockConflict.code(), 5005);
        assert_eq!(ErrorCode::AdjustmentFailed.code(), 6001);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_round_trip_conversion() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::DuplicateIdempotencyKey,
            ErrorCode::RoundingResidual,
            ErrorCode::AlreadyInGroup,
            ErrorCode::SegmentLockConflict,
            ErrorCode::AdjustmentFailed,
            ErrorCode::EmployeeNotFound,
            ErrorCode::DatabaseError,
        ];
        for code in codes {
            let value: u16 = code.into();
            assert_eq!(ErrorCode::try_from(value), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code() {
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            ErrorCode::AlreadyInGroup.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::SegmentLockConflict.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ErrorCode::GroupNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::AdjustmentFailed.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_serde_as_u16() {
        let json = serde_json::to_string(&ErrorCode::AlreadyInGroup).unwrap();
        assert_eq!(json, "5003");
        let code: ErrorCode = serde_json::from_str("5003").unwrap();
        assert_eq!(code, ErrorCode::AlreadyInGroup);
    }
}
