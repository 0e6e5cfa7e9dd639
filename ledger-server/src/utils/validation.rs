//! Input validation helpers
//!
//! Centralized text length constants and validation functions shared by
//! checkout, coupon and catalog operations.

use crate::core::{LedgerError, LedgerResult};
use shared::error::ErrorCode;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, recipient, etc.
pub const MAX_NAME_LEN: usize = 200;

/// Notes, descriptions, failure reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, postal code, ids, coupon codes
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(
    value: &str,
    field: &str,
    max_len: usize,
    code: ErrorCode,
) -> LedgerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::validation(code, format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(LedgerError::validation(
            code,
            format!("{field} is too long ({} chars, max {max_len})", value.len()),
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> LedgerResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(LedgerError::validation(
            ErrorCode::ValidationFailed,
            format!("{field} is too long ({} chars, max {max_len})", v.len()),
        ));
    }
    Ok(())
}

/// Validate a money amount: finite, non-negative, below `max`
pub fn validate_amount(value: f64, field: &str, max: f64, code: ErrorCode) -> LedgerResult<()> {
    if !value.is_finite() {
        return Err(LedgerError::validation(
            code,
            format!("{field} must be a finite number, got {value}"),
        ));
    }
    if value < 0.0 {
        return Err(LedgerError::validation(
            code,
            format!("{field} must be non-negative, got {value}"),
        ));
    }
    if value > max {
        return Err(LedgerError::validation(
            code,
            format!("{field} exceeds maximum allowed ({max}), got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Ada", "name", 10, ErrorCode::ValidationFailed).is_ok());
        assert!(validate_required_text("   ", "name", 10, ErrorCode::ValidationFailed).is_err());
        let err = validate_required_text("abcdef", "name", 3, ErrorCode::InvalidDeliveryInfo)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation {
                code: ErrorCode::InvalidDeliveryInfo,
                ..
            }
        ));
    }

    #[test]
    fn test_amount() {
        assert!(validate_amount(10.0, "price", 100.0, ErrorCode::InvalidPrice).is_ok());
        assert!(validate_amount(-1.0, "price", 100.0, ErrorCode::InvalidPrice).is_err());
        assert!(validate_amount(f64::NAN, "price", 100.0, ErrorCode::InvalidPrice).is_err());
        assert!(validate_amount(101.0, "price", 100.0, ErrorCode::InvalidPrice).is_err());
    }
}
