//! Coupon API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::models::{Coupon, CouponCreate};
use shared::order::OrderSnapshot;

use crate::api::run_blocking;
use crate::catalog::CouponCheck;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// Dry-run request: the cart as the storefront sees it
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub customer_id: String,
    #[serde(flatten)]
    pub snapshot: OrderSnapshot,
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CouponCreate>,
) -> AppResult<ApiResponse<Coupon>> {
    let catalog = state.catalog.clone();
    let coupon = run_blocking(move || catalog.create_coupon(payload)).await?;
    Ok(ApiResponse::success(coupon))
}

pub async fn get_by_code(
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<Coupon>> {
    let catalog = state.catalog.clone();
    let coupon = run_blocking(move || catalog.get_coupon(&code)).await?;
    Ok(ApiResponse::success(coupon))
}

/// Check a coupon against a cart without redeeming it
pub async fn validate(
    State(state): State<ServerState>,
    Path(code): Path<String>,
    Json(payload): Json<ValidateRequest>,
) -> AppResult<ApiResponse<CouponCheck>> {
    let catalog = state.catalog.clone();
    let check = run_blocking(move || {
        catalog.validate_coupon(&code, &payload.snapshot, &payload.customer_id)
    })
    .await?;
    Ok(ApiResponse::success(check))
}
