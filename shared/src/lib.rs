//! Shared types for the tip ledger platform
//!
//! Data models, unified error codes and response structures used by
//! tip-server and its API clients (terminal frontend, reporting).

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
