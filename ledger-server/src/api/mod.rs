//! HTTP API
//!
//! - [`health`] - liveness and storage statistics
//! - [`orders`] - checkout, lookup, status transitions, purge
//! - [`payments`] - gateway callbacks, payment start/retry, refunds
//! - [`products`] - catalog products
//! - [`coupons`] - coupons/offers and dry-run validation
//! - [`ledger`] - sales ledger recalculation
//!
//! Engine operations block on redb transactions, so every handler runs them
//! through [`run_blocking`].

pub mod coupons;
pub mod health;
pub mod ledger;
pub mod orders;
pub mod payments;
pub mod products;

use crate::core::LedgerResult;
use crate::utils::{AppError, AppResult};

/// Run an engine operation on the blocking pool and map its error
pub(crate) async fn run_blocking<T, F>(op: F) -> AppResult<T>
where
    F: FnOnce() -> LedgerResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result.map_err(AppError::from),
        Err(e) => {
            tracing::error!(error = %e, "Blocking task failed");
            Err(AppError::internal("Operation was interrupted"))
        }
    }
}
