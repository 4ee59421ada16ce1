//! Shared data types for the petalgrid simulation.
//!
//! Plain value types with serde support, consumed by the core engine and
//! the driver binary. No simulation logic lives here.

pub mod ids;
pub mod pos;
pub mod records;

pub use ids::{FlowerId, PlayerId};
pub use pos::{Pos, CARDINAL_OFFSETS, CLOCKWISE_OFFSETS};
pub use records::{FlowerRecord, TileRecord, WorldRecord};
