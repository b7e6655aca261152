//! Ledger API 模块 (余额、流水、现金支出)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/ledger", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{employee_id}/balance", get(handler::balance))
        .route("/{employee_id}/entries", get(handler::entries))
        .route("/{employee_id}/payouts", post(handler::record_payout))
}
