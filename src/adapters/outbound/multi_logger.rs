use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Fans every message out to all attached loggers, in order.
pub struct MultiLogger {
    targets: Vec<Arc<dyn DomainLogger>>,
}

impl MultiLogger {
    pub fn new(targets: Vec<Arc<dyn DomainLogger>>) -> Self {
        Self { targets }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.error(msg));
    }
}

/// Console output, plus the log file when `path` is given and `fast_log` accepts it.
pub fn init_combined_logger(path: Option<&str>) -> Arc<dyn DomainLogger> {
    let console = super::init_console_logger("locsim");
    let Some(path) = path else {
        return console;
    };
    match super::init_file_logger(path) {
        Ok(file) => Arc::new(MultiLogger::new(vec![file, console])),
        Err(e) => {
            console.warn(&format!("File logging disabled: {}", e));
            console
        }
    }
}
