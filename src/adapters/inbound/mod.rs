pub mod event_store;
pub mod file_event_store;
pub mod waypoint_source;

pub use event_store::*;
pub use file_event_store::*;
pub use waypoint_source::*;
