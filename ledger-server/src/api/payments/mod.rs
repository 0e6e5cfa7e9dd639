//! Payment API Module
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /api/payments/callback | POST | Gateway webhook |
//! | /api/orders/{n}/payment/start | POST | Register the gateway payment |
//! | /api/orders/{n}/payment/retry | POST | Reset a failed payment |
//! | /api/orders/{n}/refunds | POST | Record a refund |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/payments/callback", post(handler::callback))
        .route("/api/orders/{order_number}/payment/start", post(handler::start))
        .route("/api/orders/{order_number}/payment/retry", post(handler::retry))
        .route("/api/orders/{order_number}/refunds", post(handler::refund))
}
