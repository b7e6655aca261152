//! Tip ledger engines
//!
//! The financial core of the platform:
//! - [`ledger`] — append-only ledger service (balances, payouts)
//! - [`groups`] — tip pools with segment-sliced membership history
//! - [`ownership`] — per-order tip attribution at settlement
//! - [`tip_out`] — role-pair redistribution at shift close
//! - [`binder`] — template → runtime group binding at clock-in
//! - [`adjustment`] — retroactive corrections via replay + delta entries
//!
//! Every mutation runs inside one SQLite transaction bound to its
//! triggering event. The ledger repository exposes no update or delete;
//! history is corrected only by appending CORRECTION entries.

pub mod adjustment;
pub mod binder;
pub mod error;
pub mod groups;
pub mod ledger;
pub mod money;
pub mod ownership;
pub mod tip_out;

pub use adjustment::AdjustmentEngine;
pub use binder::TemplateBinder;
pub use error::{TipError, TipResult};
pub use groups::GroupEngine;
pub use ledger::LedgerService;
pub use ownership::OwnershipResolver;
pub use tip_out::TipOutEngine;

#[cfg(test)]
mod tests;
