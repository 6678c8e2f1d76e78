use crate::domains::logger::DomainLogger;
use chrono::Local;
use std::sync::Arc;

/// Prints playback messages to stdout/stderr with a local timestamp.
struct ConsoleLogger {
    prefix: String,
}

impl ConsoleLogger {
    fn line(&self, level: &str, msg: &str) -> String {
        format!("{} [{}] {}: {}", Local::now().format("%H:%M:%S%.3f"), self.prefix, level, msg)
    }
}

impl DomainLogger for ConsoleLogger {
    fn info(&self, msg: &str) {
        println!("{}", self.line("INFO", msg));
    }

    fn warn(&self, msg: &str) {
        println!("{}", self.line("WARN", msg));
    }

    fn error(&self, msg: &str) {
        eprintln!("{}", self.line("ERROR", msg));
    }
}

/// Console-backed logger, used as the fallback when no log file is configured.
pub fn init_console_logger(prefix: &str) -> Arc<dyn DomainLogger> {
    Arc::new(ConsoleLogger {
        prefix: prefix.to_string(),
    })
}
