//! Tracing subscriber setup

use anyhow::{Context, Result};
use sharpseq_sequencer::GeneratorConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_PREFIX: &str = "sharpseq.log";

/// Days of rolled log files kept in the log directory
const LOG_RETENTION_DAYS: i64 = 7;

/// Install the global subscriber.
///
/// Logs go to stderr, or to daily rolling files when the configuration names
/// a log directory. The returned guard must live until the process exits so
/// buffered file output is flushed.
pub fn init(config: &GeneratorConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("invalid log_level '{}'", config.log_level))?;

    let Some(log_dir) = &config.log_directory else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_ansi(false).with_writer(non_blocking))
        .init();

    tracing::info!("Logging to {}", log_dir.display());
    cleanup_old_logs(log_dir, LOG_RETENTION_DAYS);
    Ok(Some(guard))
}

/// Remove rolled files (`sharpseq.log.YYYY-MM-DD`) older than `keep_days`
fn cleanup_old_logs(log_dir: &Path, keep_days: i64) {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(keep_days);

    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read log directory for cleanup: {}", e);
            return;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(LOG_FILE_PREFIX))
            .and_then(|n| n.strip_prefix('.'))
            .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };

        if date < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!("Removed old log file {}", path.display()),
                Err(e) => tracing::warn!("Failed to remove old log file {}: {}", path.display(), e),
            }
        }
    }
}
