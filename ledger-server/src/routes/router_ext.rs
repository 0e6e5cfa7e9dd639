//! Router extension for oneshot calls
//!
//! Calls the Router directly without going through the network stack.

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use http::{Request, Response};
use tower::ServiceExt;

use crate::core::ServerState;

/// Result type for oneshot API calls
pub type OneshotResult = Result<Response<Body>>;

/// Extension trait for Router to support oneshot calls
#[async_trait::async_trait]
pub trait OneshotRouter {
    /// Process a request using the oneshot pattern
    ///
    /// ```ignore
    /// let request = Request::builder()
    ///     .uri("/health")
    ///     .body(Body::empty())?;
    ///
    /// let response = router.oneshot(&state, request).await?;
    /// ```
    async fn oneshot(&self, state: &ServerState, request: Request<Body>) -> OneshotResult;
}

#[async_trait::async_trait]
impl OneshotRouter for Router<ServerState> {
    async fn oneshot(&self, state: &ServerState, request: Request<Body>) -> OneshotResult {
        let svc: Router = self.clone().with_state(state.clone());
        let response = ServiceExt::oneshot(svc, request).await?;
        Ok(response)
    }
}
