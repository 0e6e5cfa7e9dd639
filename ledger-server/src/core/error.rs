//! Domain errors
//!
//! [`LedgerError`] is what every engine operation returns. It converts into
//! the user-visible [`AppError`] with a stable error code; storage details are
//! logged, never returned to callers.

use crate::store::StorageError;
use shared::error::{AppError, ErrorCode};
use shared::order::{OrderStatus, PaymentStatus};
use std::fmt;
use thiserror::Error;

/// Persisted resource kinds, used in not-found / already-exists errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Order,
    Product,
    Coupon,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Order => write!(f, "Order"),
            Resource::Product => write!(f, "Product"),
            Resource::Coupon => write!(f, "Coupon"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or rejected input; `code` selects the user-visible error code
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    #[error("Invalid status transition: {current} -> {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    #[error("Invalid payment transition: {current} -> {requested}")]
    InvalidPaymentTransition {
        current: PaymentStatus,
        requested: PaymentStatus,
    },

    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: String },

    #[error("{resource} already exists: {id}")]
    AlreadyExists { resource: Resource, id: String },

    /// Optimistic-concurrency retries exhausted
    #[error("Order {order_number} is being modified concurrently (gave up after {attempts} attempts)")]
    ConflictRetry { order_number: String, attempts: u32 },

    /// Transient storage failures exhausted the retry budget
    #[error("Storage unavailable after {attempts} attempts")]
    StorageUnavailable { attempts: u32 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: Resource, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Whether the operation may succeed if simply repeated
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Storage(e) if e.is_transient())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Map a storage error to an error code (callers localize by code)
fn classify_storage_error(e: &StorageError) -> ErrorCode {
    match e {
        StorageError::VersionConflict { .. } => ErrorCode::ConcurrentModification,
        StorageError::OrderNotFound(_) => ErrorCode::OrderNotFound,
        StorageError::GatewayIdTaken { .. } => ErrorCode::InvalidRequest,
        StorageError::Serialization(_) => ErrorCode::InternalError,
        _ => ErrorCode::StorageError,
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation { code, message } => AppError::with_message(code, message),
            LedgerError::InvalidTransition { current, requested } => AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                format!("Cannot move order from {} to {}", current, requested),
            )
            .with_detail("current", current.as_str())
            .with_detail("requested", requested.as_str()),
            LedgerError::InvalidPaymentTransition { current, requested } => {
                AppError::with_message(
                    ErrorCode::InvalidPaymentTransition,
                    format!("Cannot move payment from {} to {}", current, requested),
                )
                .with_detail("current", current.as_str())
                .with_detail("requested", requested.as_str())
            }
            LedgerError::NotFound { resource, id } => {
                let code = match resource {
                    Resource::Order => ErrorCode::OrderNotFound,
                    Resource::Product => ErrorCode::ProductNotFound,
                    Resource::Coupon => ErrorCode::CouponNotFound,
                };
                AppError::with_message(code, format!("{} not found: {}", resource, id))
                    .with_detail("id", id)
            }
            LedgerError::AlreadyExists { resource, id } => {
                let code = match resource {
                    Resource::Coupon => ErrorCode::CouponCodeExists,
                    _ => ErrorCode::AlreadyExists,
                };
                AppError::with_message(code, format!("{} already exists: {}", resource, id))
                    .with_detail("id", id)
            }
            LedgerError::ConflictRetry {
                order_number,
                attempts,
            } => {
                tracing::warn!(
                    order_number = %order_number,
                    attempts,
                    "Optimistic concurrency retries exhausted"
                );
                AppError::new(ErrorCode::ConcurrentModification)
                    .with_detail("order_number", order_number)
            }
            LedgerError::StorageUnavailable { attempts } => {
                tracing::error!(attempts, "Storage unavailable");
                AppError::new(ErrorCode::StorageUnavailable)
            }
            LedgerError::Storage(e) => {
                let code = classify_storage_error(&e);
                tracing::error!(error = %e, error_code = %code, "Storage error occurred");
                AppError::new(code)
            }
            LedgerError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}
