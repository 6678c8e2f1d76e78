use crate::domains::logger::DomainLogger;
use std::sync::Arc;
use tokio::sync::mpsc;

enum Level {
    Info,
    Warn,
    Error,
}

struct LogMessage {
    level: Level,
    msg: String,
}

struct BufferedLogger {
    sender: mpsc::Sender<LogMessage>,
}

impl BufferedLogger {
    // Never blocks a tick: messages are dropped when the channel is full.
    fn push(&self, level: Level, msg: &str) {
        let _ = self.sender.try_send(LogMessage {
            level,
            msg: msg.to_string(),
        });
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}

/// Non-blocking logger that forwards to `sink` from a background task.
/// Must be called inside a tokio runtime.
pub fn init_buffered_logger(sink: Arc<dyn DomainLogger>, capacity: usize) -> Arc<dyn DomainLogger> {
    let (tx, mut rx) = mpsc::channel::<LogMessage>(capacity.max(1));

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message.level {
                Level::Info => sink.info(&message.msg),
                Level::Warn => sink.warn(&message.msg),
                Level::Error => sink.error(&message.msg),
            }
        }
    });

    Arc::new(BufferedLogger { sender: tx })
}
