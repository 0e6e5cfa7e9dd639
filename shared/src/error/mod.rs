//! Unified error system for the commerce ledger
//!
//! - [`ErrorCode`]: standardized, stable error codes
//! - [`ErrorCategory`]: classification of errors by domain
//! - [`AppError`]: user-visible error with code, message and details
//! - [`ApiResponse`]: unified API response envelope
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product errors
//! - 7xxx: Coupon errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::with_message(ErrorCode::OrderNotFound, "Order ORD-1 not found")
//!     .with_detail("order_number", "ORD-1");
//! let response = ApiResponse::from(err);
//! assert_eq!(response.code, 4001);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
