//! Ledger Store - redb persistence, counters and storage retry
//!
//! - [`LedgerStorage`] - tables for orders, products, coupons and their indexes
//! - [`RetryPolicy`] - bounded retry of transient storage failures

pub mod retry;
pub mod storage;

pub use retry::{RetryPolicy, with_storage_retry};
pub use storage::{LedgerStorage, SalesAdjustment, StorageError, StorageResult, StorageStats};
