pub mod densify;
pub mod geodesy;
pub mod geofence;
pub mod point;
pub mod shape;

pub use densify::*;
pub use geodesy::*;
pub use geofence::*;
pub use point::*;
pub use shape::*;
