//! Unified error codes for the commerce ledger
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product errors
//! - 7xxx: Coupon / offer errors
//! - 9xxx: System errors
//!
//! Codes are part of the public contract: once published they never change
//! meaning, so clients may switch on them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Concurrent modification, caller should re-read and retry
    ConcurrentModification = 6,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status transition is not allowed
    InvalidStatusTransition = 4002,
    /// Order has no items
    OrderEmpty = 4003,
    /// Invalid quantity
    InvalidQuantity = 4004,
    /// Invalid delivery information
    InvalidDeliveryInfo = 4005,

    // ==================== 5xxx: Payment ====================
    /// Requested payment state change is not allowed
    InvalidPaymentTransition = 5001,
    /// Payment method does not support the operation
    PaymentInvalidMethod = 5002,
    /// Invalid refund amount
    InvalidRefundAmount = 5003,

    // ==================== 6xxx: Product ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Product is not available for sale
    ProductInactive = 6002,
    /// Invalid price
    InvalidPrice = 6003,

    // ==================== 7xxx: Coupon ====================
    /// Coupon or offer not found
    CouponNotFound = 7001,
    /// Coupon code already exists
    CouponCodeExists = 7002,
    /// Coupon cannot be applied to the order
    CouponNotApplicable = 7003,
    /// Invalid coupon definition
    InvalidCouponDefinition = 7004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Storage error
    StorageError = 9002,
    /// Storage temporarily unavailable, retries exhausted
    StorageUnavailable = 9003,
    /// Configuration error
    ConfigError = 9004,
}

impl ErrorCode {
    /// Numeric value of the code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether this code represents success
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Stable default message for the code
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::ConcurrentModification => "Resource was modified concurrently, please retry",

            Self::OrderNotFound => "Order not found",
            Self::InvalidStatusTransition => "Order status transition not allowed",
            Self::OrderEmpty => "Order has no items",
            Self::InvalidQuantity => "Invalid quantity",
            Self::InvalidDeliveryInfo => "Invalid delivery information",

            Self::InvalidPaymentTransition => "Payment state change not allowed",
            Self::PaymentInvalidMethod => "Payment method does not support this operation",
            Self::InvalidRefundAmount => "Invalid refund amount",

            Self::ProductNotFound => "Product not found",
            Self::ProductInactive => "Product is not available",
            Self::InvalidPrice => "Invalid price",

            Self::CouponNotFound => "Coupon not found",
            Self::CouponCodeExists => "Coupon code already exists",
            Self::CouponNotApplicable => "Coupon cannot be applied to this order",
            Self::InvalidCouponDefinition => "Invalid coupon definition",

            Self::InternalError => "Internal server error",
            Self::StorageError => "Storage error",
            Self::StorageUnavailable => "Storage temporarily unavailable",
            Self::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::ConcurrentModification),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidStatusTransition),
            4003 => Ok(ErrorCode::OrderEmpty),
            4004 => Ok(ErrorCode::InvalidQuantity),
            4005 => Ok(ErrorCode::InvalidDeliveryInfo),

            // Payment
            5001 => Ok(ErrorCode::InvalidPaymentTransition),
            5002 => Ok(ErrorCode::PaymentInvalidMethod),
            5003 => Ok(ErrorCode::InvalidRefundAmount),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ProductInactive),
            6003 => Ok(ErrorCode::InvalidPrice),

            // Coupon
            7001 => Ok(ErrorCode::CouponNotFound),
            7002 => Ok(ErrorCode::CouponCodeExists),
            7003 => Ok(ErrorCode::CouponNotApplicable),
            7004 => Ok(ErrorCode::InvalidCouponDefinition),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StorageError),
            9003 => Ok(ErrorCode::StorageUnavailable),
            9004 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::InvalidPaymentTransition.code(), 5001);
        assert_eq!(ErrorCode::ProductNotFound.code(), 6001);
        assert_eq!(ErrorCode::CouponNotFound.code(), 7001);
        assert_eq!(ErrorCode::StorageUnavailable.code(), 9003);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(4002), Ok(ErrorCode::InvalidStatusTransition));
        assert_eq!(ErrorCode::try_from(7002), Ok(ErrorCode::CouponCodeExists));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
        assert_eq!(
            InvalidErrorCode(4999).to_string(),
            "invalid error code: 4999"
        );
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::CouponNotApplicable).unwrap();
        assert_eq!(json, "7003");
        let code: ErrorCode = serde_json::from_str("9003").unwrap();
        assert_eq!(code, ErrorCode::StorageUnavailable);
        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::Success.message(), "Success");
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
    }
}
