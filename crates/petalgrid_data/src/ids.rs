use serde::{Deserialize, Serialize};

/// Identity of a player tile (bot or remote human), assigned sequentially
/// by the world. Session-level identity is handled outside the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PlayerId(pub u32);

/// Identity of a flower entity. Stable for the flower's whole life, so a
/// flower aging in place keeps its identity while a replacement does not.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FlowerId(pub u64);
