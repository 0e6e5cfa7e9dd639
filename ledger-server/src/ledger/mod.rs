//! Sales Ledger - derived counters kept in step with counted orders
//!
//! - [`apply_delta`] - guarded increment / decrement inside an order write
//! - [`recalculate`] - full recomputation from counted orders

pub mod reconcile;
pub mod updater;

#[cfg(test)]
pub(crate) mod test_support;

pub use reconcile::{RecalculationReport, recalculate};
pub use updater::{LedgerDelta, apply_delta};
