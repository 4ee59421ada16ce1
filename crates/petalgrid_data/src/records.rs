use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;

/// Stored form of a flower. Ages and growth delays are persisted so a
/// reloaded world resumes growth where it left off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowerRecord {
    pub creator: PlayerId,
    pub poisonous: bool,
    pub tier: u8,
    pub age: u32,
    pub growth_delay: u32,
}

/// Stored form of a single grid cell. `None` in the surrounding
/// `Option<TileRecord>` denotes an empty cell; player tiles persist as
/// empty because players re-enter the world through their own channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TileRecord {
    Grass { texture: u8 },
    Block { tier: u8 },
    Flower(FlowerRecord),
}

/// Both tile layers of the world, row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldRecord {
    pub foreground: Vec<Option<TileRecord>>,
    pub background: Vec<Option<TileRecord>>,
}
