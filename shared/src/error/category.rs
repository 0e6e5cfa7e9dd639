//! Which part of the ledger an error code belongs to

use super::codes::ErrorCode;
use serde::Serialize;

/// Domain of an error code, taken from its thousands range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Order,
    Payment,
    Product,
    Coupon,
    /// 9xxx and any unassigned range
    System,
}

impl ErrorCategory {
    pub fn is_system(self) -> bool {
        self == ErrorCategory::System
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self.code() / 1000 {
            0 => ErrorCategory::General,
            4 => ErrorCategory::Order,
            5 => ErrorCategory::Payment,
            6 => ErrorCategory::Product,
            7 => ErrorCategory::Coupon,
            _ => ErrorCategory::System,
        }
    }
}
