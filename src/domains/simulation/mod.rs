pub mod actors;
pub mod aggregate;
pub mod clock;
pub mod events;
pub mod plan;
pub mod ports;
pub mod projections;

pub use actors::*;
pub use aggregate::*;
pub use clock::*;
pub use events::*;
pub use plan::*;
pub use ports::*;
pub use projections::*;
