//! Ledger Server - order lifecycle and sales ledger engine
//!
//! # Architecture
//!
//! - **orders**: checkout, fulfilment state machine, version-checked writes
//! - **payments**: idempotent gateway callback reconciliation and refunds
//! - **ledger**: product sales counters and coupon usage, exactly once per order
//! - **discount**: coupon/offer validation and discount computation
//! - **catalog**: products and coupon definitions
//! - **store**: redb persistence and retry policy
//! - **notify**: post-commit order notifications
//! - **api** / **routes**: HTTP surface
//!
//! ```text
//! ledger-server/src/
//! ├── core/          # config, state, errors, tasks, server
//! ├── store/         # redb tables, CAS writes, retry
//! ├── orders/        # checkout, state machine, writer, manager
//! ├── payments/      # reconciler
//! ├── ledger/        # apply_delta, recalculate
//! ├── discount/      # engine, calculator
//! ├── catalog/       # products, coupons
//! ├── notify/        # notifier, worker
//! ├── api/           # HTTP handlers
//! ├── routes/        # router assembly, oneshot
//! └── utils/         # money, validation, logger
//! ```

pub mod api;
pub mod catalog;
pub mod core;
pub mod discount;
pub mod ledger;
pub mod notify;
pub mod orders;
pub mod payments;
pub mod routes;
pub mod store;
pub mod utils;

// Re-export public types
pub use catalog::CatalogService;
pub use core::{Config, LedgerError, LedgerResult, Server, ServerState};
pub use orders::OrdersManager;
pub use payments::PaymentReconciler;
pub use store::LedgerStorage;

// Re-export unified error types from shared
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Load `.env`, read the configuration and start logging
pub fn setup_environment() -> anyhow::Result<Config> {
    // A missing .env file is fine
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    let log_dir = config.log_dir();
    init_logger_with_file(&config.log_level, config.log_json, log_dir.to_str())?;
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    __           __
   / /  ___ ____/ /__ ____ ____
  / /__/ -_) _  / _ `/ -_) __/
 /____/\__/\_,_/\_, /\__/_/
               /___/
    "#
    );
}
