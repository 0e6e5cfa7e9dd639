//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Product, ProductUpsert};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Product>> {
    let catalog = state.catalog.clone();
    let product = run_blocking(move || catalog.get_product(&id)).await?;
    Ok(ApiResponse::success(product))
}

/// Create or replace a product (`sales_count` is preserved)
pub async fn upsert(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpsert>,
) -> AppResult<ApiResponse<Product>> {
    let catalog = state.catalog.clone();
    let product = run_blocking(move || catalog.upsert_product(&id, payload)).await?;
    Ok(ApiResponse::success(product))
}
