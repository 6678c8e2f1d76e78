use crate::domains::logger::DomainLogger;
use chrono::Utc;
use std::sync::Arc;

/// Forwards to the `log` facade, which `fast_log` writes to the configured file.
struct FastLogBridge;

impl DomainLogger for FastLogBridge {
    fn info(&self, msg: &str) {
        log::info!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log::warn!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log::error!("{} - {}", Utc::now().to_rfc3339(), msg);
    }
}

/// Install `fast_log` with a file appender at `path` and return a logger bound to it.
/// Only one `log` backend can be installed per process; a second call fails.
pub fn init_file_logger(path: &str) -> Result<Arc<dyn DomainLogger>, String> {
    fast_log::init(
        fast_log::config::Config::new()
            .file(path)
            .level(log::LevelFilter::Info),
    )
    .map_err(|e| format!("Failed to initialize fast_log at {}: {}", path, e))?;
    Ok(Arc::new(FastLogBridge))
}
