//! Order lifecycle
//!
//! - **checkout**: request validation, catalog pricing, delivery charge
//! - **state_machine**: fulfilment transitions and their side effects
//! - **writer**: version-conditioned writes carrying the ledger delta
//! - **manager**: OrdersManager, the entry point for every order operation
//!
//! # Data Flow
//!
//! ```text
//! create_order ─→ checkout ─→ insert (version 1)
//!
//! transition ─→ state_machine (pure) ─→ OrderWriter::mutate
//!                                          ├─ ledger::apply_delta
//!                                          └─ compare_and_store_order
//!                                                 ↓
//!                                              Notifier
//! ```

pub mod checkout;
pub mod manager;
pub mod state_machine;
pub mod writer;

// Re-exports
pub use checkout::{CheckoutSettings, CreateOrder};
pub use manager::OrdersManager;
pub use state_machine::{DeliverySchedule, Transition, transition};
pub use writer::{Committed, Mutation, OrderWriter};
