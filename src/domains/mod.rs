pub mod geo;
pub mod logger;
pub mod simulation;

pub use geo::*;
pub use logger::*;
pub use simulation::*;
