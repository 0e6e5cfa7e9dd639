//! Order API Module
//!
//! Checkout, lookup and fulfilment. Every mutation goes through OrdersManager.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", post(handler::create))
        .route(
            "/api/orders/{order_number}",
            get(handler::get_by_number).delete(handler::purge),
        )
        .route("/api/orders/{order_number}/status", post(handler::transition))
        .route(
            "/api/customers/{customer_id}/orders",
            get(handler::list_for_customer),
        )
}
