pub mod buffered_logger;
pub mod console_logger;
pub mod file_logger;
pub mod location_updater;
pub mod multi_logger;
pub mod noop_logger;
pub mod subscriber;

pub use buffered_logger::*;
pub use console_logger::*;
pub use file_logger::*;
pub use location_updater::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use subscriber::*;
