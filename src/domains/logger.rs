use std::sync::Arc;

/// Domain-level logging port.
/// Simulations report through it so hosts can route playback messages
/// independently of the process-wide `tracing` subscriber.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;
