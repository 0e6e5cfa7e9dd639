//! Payment reconciliation
//!
//! Gateway callbacks, payment start/retry and refunds. Every change goes
//! through the order writer so that the paid transition and the sales
//! ledger increment commit together.

pub mod reconciler;

pub use reconciler::{CallbackOutcome, PaymentCallback, PaymentReconciler, ReconcileResult};
