//! Tip group API 模块 (小费池管理)

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tip-groups", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_active).post(handler::create))
        .route("/{id}/history", get(handler::history))
        .route("/{id}/members", post(handler::add_member))
        .route(
            "/{id}/members/{employee_id}",
            delete(handler::remove_member),
        )
}
