//! Product API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/products/{id}",
        get(handler::get_by_id).put(handler::upsert),
    )
}
