//! Shared types for the commerce ledger
//!
//! Domain types used by every component of the ledger engine: orders and
//! their status tables, products, coupons/offers, the unified error system
//! and time helpers.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
