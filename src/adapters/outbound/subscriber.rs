use tracing_subscriber::EnvFilter;

/// Install the process-wide `tracing` subscriber, filtered by `RUST_LOG` or
/// `default_directive`.
///
/// The subscriber does not claim the `log` facade, which stays free for the
/// `fast_log` file sink installed by `init_file_logger`.
pub fn init_tracing(default_directive: &str) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .try_init()
        .map_err(|e| format!("Failed to install tracing subscriber: {}", e))
}
