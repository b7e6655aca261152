//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 2xxx: Permission errors
/// - 4xxx: Ledger errors
/// - 5xxx: Tip group errors
/// - 6xxx: Adjustment errors
/// - 8xxx: Employee/shift errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Permission errors (2xxx)
    Permission,
    /// Ledger errors (4xxx)
    Ledger,
    /// Tip group errors (5xxx)
    TipGroup,
    /// Adjustment errors (6xxx)
    Adjustment,
    /// Employee/shift errors (8xxx)
    Employee,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            2000..3000 => Self::Permission,
            4000..5000 => Self::Ledger,
            5000..6000 => Self::TipGroup,
            6000..7000 => Self::Adjustment,
            8000..9000 => Self::Employee,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Permission => "permission",
            Self::Ledger => "ledger",
            Self::TipGroup => "tip_group",
            Self::Adjustment => "adjustment",
            Self::Employee => "employee",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
