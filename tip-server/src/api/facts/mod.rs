//! Read-only fact mirrors (员工、角色、分出规则)

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/facts", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/employees", post(handler::upsert_employees))
        .route("/roles", post(handler::upsert_roles))
        .route("/tip-out-rules", post(handler::upsert_tip_out_rules))
}
