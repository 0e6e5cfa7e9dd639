//! Health routes
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /health | GET | Liveness |
//! | /health/detailed | GET | Storage reachability and record counts |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::time::Instant;

use crate::core::ServerState;
use crate::store::StorageStats;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(detailed_health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub struct DetailedHealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    database: CheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<StorageStats>,
}

#[derive(Serialize)]
pub struct CheckResult {
    status: &'static str,
    latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn detailed_health(State(state): State<ServerState>) -> Json<DetailedHealthResponse> {
    let storage = state.storage.clone();
    let started = Instant::now();
    let stats = tokio::task::spawn_blocking(move || storage.get_stats()).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let (database, stats) = match stats {
        Ok(Ok(stats)) => (
            CheckResult {
                status: "ok",
                latency_ms,
                message: None,
            },
            Some(stats),
        ),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Health check: storage unreachable");
            (
                CheckResult {
                    status: "error",
                    latency_ms,
                    message: Some("storage unreachable".to_string()),
                },
                None,
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Health check task failed");
            (
                CheckResult {
                    status: "error",
                    latency_ms,
                    message: Some("check interrupted".to_string()),
                },
                None,
            )
        }
    };

    Json(DetailedHealthResponse {
        status: if database.status == "ok" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        database,
        stats,
    })
}
