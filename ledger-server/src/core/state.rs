use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogService;
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::notify::{LogDispatcher, NotificationWorker, Notifier};
use crate::orders::OrdersManager;
use crate::payments::PaymentReconciler;
use crate::store::LedgerStorage;

/// Server state - shared handles to every service
///
/// Cloning is cheap: services sit behind `Arc`, the storage handle is an
/// `Arc<Database>` internally.
///
/// | Field | Purpose |
/// |-------|---------|
/// | config | Immutable configuration |
/// | storage | redb database (orders, products, coupons, counters) |
/// | orders | Checkout, fulfilment, purge, ledger recalculation |
/// | payments | Gateway callbacks, payment retry, refunds |
/// | catalog | Products and coupons |
/// | notifier | Order notification broadcast |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: LedgerStorage,
    pub orders: Arc<OrdersManager>,
    pub payments: Arc<PaymentReconciler>,
    pub catalog: Arc<CatalogService>,
    pub notifier: Notifier,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// Wire every service onto an opened storage
    pub fn new(config: Config, storage: LedgerStorage) -> Self {
        let notifier = Notifier::new(config.notification_channel_capacity);
        let orders = OrdersManager::from_config(storage.clone(), &config, notifier.clone());
        let payments = PaymentReconciler::from_config(storage.clone(), &config, notifier.clone());
        let catalog = CatalogService::from_config(storage.clone(), &config);

        Self {
            config,
            storage,
            orders: Arc::new(orders),
            payments: Arc::new(payments),
            catalog: Arc::new(catalog),
            notifier,
        }
    }

    /// Create the work directory and open the database
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        let work_dir = PathBuf::from(&config.work_dir);
        std::fs::create_dir_all(&work_dir)
            .with_context(|| format!("Failed to create work dir {}", work_dir.display()))?;

        let db_path = config.database_path();
        let storage = LedgerStorage::open(&db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        match storage.get_stats() {
            Ok(stats) => tracing::info!(
                path = %db_path.display(),
                orders = stats.orders,
                products = stats.products,
                coupons = stats.coupons,
                "Ledger database opened"
            ),
            Err(e) => tracing::warn!(error = %e, "Failed to read database stats"),
        }

        Ok(Self::new(config.clone(), storage))
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    /// Start the notification worker and the periodic ledger sweep
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let worker = NotificationWorker::new(Arc::new(LogDispatcher));
        let rx = self.notifier.subscribe();
        let token = tasks.shutdown_token();
        tasks.spawn("notification_worker", TaskKind::Worker, async move {
            worker.run(rx, token).await;
        });

        let interval_secs = self.config.ledger_reconcile_interval_secs;
        if interval_secs > 0 {
            let orders = self.orders.clone();
            let token = tasks.shutdown_token();
            tasks.spawn("ledger_reconcile", TaskKind::Periodic, async move {
                run_reconcile_sweep(orders, Duration::from_secs(interval_secs), token).await;
            });
        }

        tasks.log_summary();
        tasks
    }
}

/// Recalculate the sales ledger every `period` until shutdown
async fn run_reconcile_sweep(
    orders: Arc<OrdersManager>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately; skip it so startup stays quiet
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        let orders = orders.clone();
        match tokio::task::spawn_blocking(move || orders.recalculate_sales_ledger()).await {
            Ok(Ok(report)) if report.drift_corrected > 0 => {
                tracing::warn!(
                    target: "ledger",
                    drift_corrected = report.drift_corrected,
                    products_updated = report.products_updated,
                    coupons_updated = report.coupons_updated,
                    "Periodic sweep corrected ledger drift"
                );
            }
            Ok(Ok(_)) => tracing::debug!("Periodic ledger sweep: no drift"),
            Ok(Err(e)) => tracing::error!(error = %e, "Periodic ledger sweep failed"),
            Err(e) => tracing::error!(error = %e, "Periodic ledger sweep task failed"),
        }
    }
}
