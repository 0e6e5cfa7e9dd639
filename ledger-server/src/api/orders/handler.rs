//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::order::{Order, OrderStatus};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::orders::CreateOrder;
use crate::utils::{ApiResponse, AppResult};

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Place an order
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrder>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(move || orders.create_order(payload)).await?;
    Ok(ApiResponse::success(order))
}

pub async fn get_by_number(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(move || orders.get_order(&order_number)).await?;
    Ok(ApiResponse::success(order))
}

/// Orders of one customer, newest first
pub async fn list_for_customer(
    State(state): State<ServerState>,
    Path(customer_id): Path<String>,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let orders = state.orders.clone();
    let list = run_blocking(move || orders.list_orders_for_customer(&customer_id)).await?;
    Ok(ApiResponse::success(list))
}

/// Move an order to a new fulfilment status
pub async fn transition(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
    Json(payload): Json<TransitionRequest>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(move || {
        orders.transition_order_status(&order_number, payload.status, payload.note)
    })
    .await?;
    Ok(ApiResponse::success(order))
}

/// Administrative purge
pub async fn purge(
    State(state): State<ServerState>,
    Path(order_number): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let removed = run_blocking(move || orders.purge_order(&order_number)).await?;
    Ok(ApiResponse::success(removed))
}
