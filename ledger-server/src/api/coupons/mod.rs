//! Coupon / Offer API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/coupons", post(handler::create))
        .route("/api/coupons/{code}", get(handler::get_by_code))
        .route("/api/coupons/{code}/validate", post(handler::validate))
}
