use std::path::PathBuf;
use std::str::FromStr;

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment (a `.env` file is
/// loaded first by `main`):
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./work_dir | Database and log directory |
/// | HTTP_PORT | 3000 | HTTP port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | Default tracing filter |
/// | LOG_JSON | false | JSON log lines |
/// | MAX_CONFLICT_RETRIES | 5 | Optimistic-concurrency attempts per order write |
/// | STORAGE_RETRY_ATTEMPTS | 3 | Attempts on transient storage errors |
/// | STORAGE_RETRY_BACKOFF_MS | 25 | First storage retry backoff |
/// | DELIVERY_CHARGE | 50.0 | Flat delivery charge |
/// | FREE_DELIVERY_THRESHOLD | 999.0 | Subtotal at which delivery is free |
/// | FAST_DELIVERY_ZONES | (empty) | Comma list of cities / postal prefixes |
/// | FAST_DELIVERY_DAYS | 2 | Delivery estimate inside fast zones |
/// | STANDARD_DELIVERY_DAYS | 4 | Delivery estimate elsewhere |
/// | LEDGER_RECONCILE_INTERVAL_SECS | 0 | Periodic ledger sweep (0 = off) |
/// | NOTIFICATION_CHANNEL_CAPACITY | 1024 | Notification broadcast buffer |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/ledger HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database file and logs
    pub work_dir: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,

    // === Concurrency ===
    pub max_conflict_retries: u32,
    pub storage_retry_attempts: u32,
    pub storage_retry_backoff_ms: u64,

    // === Checkout pricing ===
    pub delivery_charge: f64,
    pub free_delivery_threshold: f64,

    // === Fulfilment ===
    pub fast_delivery_zones: Vec<String>,
    pub fast_delivery_days: u32,
    pub standard_delivery_days: u32,

    // === Background tasks ===
    pub ledger_reconcile_interval_secs: u64,
    pub notification_channel_capacity: usize,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_zones(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|z| z.trim().to_lowercase())
        .filter(|z| !z.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./work_dir".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),

            max_conflict_retries: env_or("MAX_CONFLICT_RETRIES", 5),
            storage_retry_attempts: env_or("STORAGE_RETRY_ATTEMPTS", 3),
            storage_retry_backoff_ms: env_or("STORAGE_RETRY_BACKOFF_MS", 25),

            delivery_charge: env_or("DELIVERY_CHARGE", 50.0),
            free_delivery_threshold: env_or("FREE_DELIVERY_THRESHOLD", 999.0),

            fast_delivery_zones: parse_zones(
                &std::env::var("FAST_DELIVERY_ZONES").unwrap_or_default(),
            ),
            fast_delivery_days: env_or("FAST_DELIVERY_DAYS", 2),
            standard_delivery_days: env_or("STANDARD_DELIVERY_DAYS", 4),

            ledger_reconcile_interval_secs: env_or("LEDGER_RECONCILE_INTERVAL_SECS", 0),
            notification_channel_capacity: env_or("NOTIFICATION_CHANNEL_CAPACITY", 1024),
        }
    }

    /// Override part of the configuration
    ///
    /// Mostly used by tests
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Path of the redb database file
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("ledger.redb")
    }

    /// Directory for rolling log files
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
