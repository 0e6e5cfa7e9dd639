//! Utility module
//!
//! - [`money`] - decimal-backed money arithmetic
//! - [`validation`] - shared input limits and checks
//! - [`logger`] - tracing setup

pub mod logger;
pub mod money;
pub mod validation;

// Re-export the unified error types from shared
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
