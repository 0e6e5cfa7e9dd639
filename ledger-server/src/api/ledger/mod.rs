//! Sales ledger API
//!
//! `POST /api/ledger/recalculate` rebuilds every derived counter from the
//! counted orders and reports the drift it corrected.

use axum::{Router, extract::State, routing::post};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::ledger::RecalculationReport;
use crate::utils::{ApiResponse, AppResult};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/ledger/recalculate", post(recalculate))
}

async fn recalculate(State(state): State<ServerState>) -> AppResult<ApiResponse<RecalculationReport>> {
    let orders = state.orders.clone();
    let report = run_blocking(move || orders.recalculate_sales_ledger()).await?;
    Ok(ApiResponse::success(report))
}
