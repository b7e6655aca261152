//! Collaborator event ingestion (订单结算、打卡、交班、工时)

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/events", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/settlement", post(handler::settlement))
        .route("/clock-in", post(handler::clock_in))
        .route("/shift-close", post(handler::shift_close))
        .route("/segment-hours", post(handler::segment_hours))
}
