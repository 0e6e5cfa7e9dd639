//! Data models
//!
//! Catalog-side records the ledger keeps counters on.

pub mod coupon;
pub mod product;

// Re-exports
pub use coupon::*;
pub use product::*;
