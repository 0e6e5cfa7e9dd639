//! Logging Infrastructure
//!
//! Structured logging for development and production.
//!
//! - Console output, pretty or JSON
//! - Daily rotating application logs (deleted after 14 days)
//! - Daily ledger logs, target `ledger` (never deleted): every counter
//!   change, drift correction and clamp lands here

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt, prelude::*};

/// Target of the permanent ledger log
pub const LEDGER_TARGET: &str = "ledger";

/// Application logs older than this are removed
const APP_LOG_RETENTION_DAYS: i64 = 14;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Clean up application log files older than the retention window
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<()> {
    use chrono::{Local, TimeZone};

    let cutoff = Local::now() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);
    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // app.YYYY-MM-DD
        let Some(date_part) = name.strip_prefix("app.") else {
            continue;
        };
        let Ok(date) = chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") else {
            continue;
        };
        let expired = date
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| Local.from_local_datetime(&midnight).single())
            .is_some_and(|day| day < cutoff);
        if expired {
            fs::remove_file(&path)?;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(())
}

/// Initialize the logging system
///
/// `RUST_LOG` overrides `level` when set.
///
/// ```no_run
/// // Development setup (console only)
/// ledger_server::init_logger_with_file("debug", false, None)?;
///
/// // Production setup (console + files)
/// ledger_server::init_logger_with_file("info", true, Some("./work_dir/logs"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(json_format)];

    if let Some(dir) = log_dir {
        let log_dir = Path::new(dir);
        let app_log_dir = log_dir.join("app");
        let ledger_log_dir = log_dir.join(LEDGER_TARGET);
        fs::create_dir_all(&app_log_dir)?;
        fs::create_dir_all(&ledger_log_dir)?;

        // Everything goes to the app log, ledger lines included
        let app_log = RollingFileAppender::new(Rotation::DAILY, app_log_dir, "app");
        layers.push(file_layer(app_log, json_format, |_| true));

        let ledger_log = RollingFileAppender::new(Rotation::DAILY, ledger_log_dir, LEDGER_TARGET);
        layers.push(file_layer(ledger_log, json_format, |meta| {
            meta.target() == LEDGER_TARGET
        }));

        tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;
    Ok(())
}

/// Initialize the logging system (console only)
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

fn console_layer(json_format: bool) -> BoxedLayer {
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    }
}

fn file_layer(
    appender: RollingFileAppender,
    json_format: bool,
    keep: fn(&tracing::Metadata<'_>) -> bool,
) -> BoxedLayer {
    let writer = std::sync::Mutex::new(appender);
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(writer)
            .with_filter(filter::filter_fn(keep))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter::filter_fn(keep))
            .boxed()
    }
}

/// Runs every hour to clean old logs
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        sleep(Duration::from_secs(3600)).await;

        if let Err(e) = cleanup_old_logs(&log_dir) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_only_expired_app_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(&app).unwrap();

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        fs::write(app.join("app.2001-01-01"), "old").unwrap();
        fs::write(app.join(format!("app.{}", today)), "new").unwrap();
        fs::write(app.join("notes.txt"), "keep").unwrap();

        cleanup_old_logs(dir.path()).unwrap();

        assert!(!app.join("app.2001-01-01").exists());
        assert!(app.join(format!("app.{}", today)).exists());
        assert!(app.join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_without_app_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cleanup_old_logs(dir.path()).is_ok());
    }
}
