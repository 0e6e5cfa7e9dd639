//! Discount Engine - coupon / offer validation and discount computation
//!
//! Both halves are pure functions over a coupon and an [`OrderSnapshot`].
//! Redemption bookkeeping belongs to the sales ledger.
//!
//! [`OrderSnapshot`]: shared::order::OrderSnapshot

pub mod calculator;
pub mod engine;

pub use calculator::compute_discount;
pub use engine::{RejectReason, ValidationResult, check, validate};
