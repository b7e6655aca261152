//! HTTP API
//!
//! Per-resource routers. Authorization (manager gating on adjustments
//! and payouts) lives in the collaborator layer in front of this
//! service; requests arriving here carry already-verified identities.

pub mod adjustments;
pub mod events;
pub mod facts;
pub mod health;
pub mod ledger;
pub mod tip_groups;
pub mod tip_templates;

use crate::core::ServerState;
use axum::Router;

pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(ledger::router())
        .merge(tip_groups::router())
        .merge(tip_templates::router())
        .merge(adjustments::router())
        .merge(events::router())
        .merge(facts::router())
}
