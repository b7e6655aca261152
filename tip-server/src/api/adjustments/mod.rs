//! Adjustment API 模块 (经理端回溯修正)

mod handler;

use axum::{
    Router,
    routing::get,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/adjustments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::apply))
        .route("/{id}", get(handler::get_by_id))
}
