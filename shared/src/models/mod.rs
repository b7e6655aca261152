//! Data models
//!
//! Shared between tip-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes; all timestamps are Unix millis (`i64`);
//! all monetary amounts are `i64` minor currency units (cents).

pub mod adjustment;
pub mod employee;
pub mod ledger;
pub mod ownership;
pub mod role;
pub mod shift;
pub mod tip_group;
pub mod tip_out;
pub mod tip_template;

// Re-exports
pub use adjustment::*;
pub use employee::*;
pub use ledger::*;
pub use ownership::*;
pub use role::*;
pub use shift::*;
pub use tip_group::*;
pub use tip_out::*;
pub use tip_template::*;
