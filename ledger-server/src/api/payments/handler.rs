//! Payment API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::order::Order;

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::payments::{PaymentCallback, ReconcileResult};
use crate::utils::{ApiResponse, AppResult};

#[derive(Debug, Deserialize)]
pub struct StartPaymentRequest {
    pub gateway_payment_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub amount: f64,
}

/// Gateway webhook
///
/// Duplicate deliveries answer with `replayed: true` and change nothing.
pub async fn callback(
    State(state): State<ServerState>,
    Json(payload): Json<PaymentCallback>,
) -> AppResult<ApiResponse<ReconcileResult>> {
    let payments = state.payments.clone();
    let result = run_blocking(move || payments.reconcile(&payload)).await?;
    Ok(ApiResponse::success(result))
}

pub async fn start(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
    Json(payload): Json<StartPaymentRequest>,
) -> AppResult<ApiResponse<Order>> {
    let payments = state.payments.clone();
    let order = run_blocking(move || {
        payments.begin_payment(&order_number, &payload.gateway_payment_id)
    })
    .await?;
    Ok(ApiResponse::success(order))
}

pub async fn retry(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let payments = state.payments.clone();
    let order = run_blocking(move || payments.retry_payment(&order_number)).await?;
    Ok(ApiResponse::success(order))
}

pub async fn refund(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<ApiResponse<Order>> {
    let payments = state.payments.clone();
    let order = run_blocking(move || payments.record_refund(&order_number, payload.amount)).await?;
    Ok(ApiResponse::success(order))
}
