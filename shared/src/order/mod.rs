//! Order Module
//!
//! - Status: fulfilment and payment status enums with their transition tables
//! - Types: line items, pricing, payment and history value types
//! - Document: the persisted order
//! - Snapshot: the pricing view used for discount validation

pub mod document;
pub mod snapshot;
pub mod status;
pub mod types;

// Re-exports
pub use document::Order;
pub use snapshot::{OrderSnapshot, SnapshotItem};
pub use status::{OrderStatus, PaymentMethod, PaymentStatus};
pub use types::*;
