//! Tile catalog for the double-layer world grid.
//!
//! The foreground layer holds everything a player can collide with; the
//! background layer only ever holds empty ground or decorative grass.
//! Entity tiles (flowers, players) carry an id into the world's entity
//! maps rather than their data, so tiles stay `Copy` and path snapshots
//! compare by identity the way the planner expects.

use petalgrid_data::{FlowerId, PlayerId, Pos};
use serde::{Deserialize, Serialize};

/// Growth stages a flower spends as an unwalkable sprout before maturing.
pub const SPROUT_STAGE_COUNT: u32 = 3;

/// Number of block/flower power tiers in the catalog.
pub const TIER_COUNT: u8 = 24;

/// Distinct grass textures (purely cosmetic, but persisted).
pub const GRASS_TEXTURE_COUNT: u8 = 3;

/// Ticks a mature flower survives past its final growth stage.
pub const FLOWER_MATURE_LIFETIME: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Grass { texture: u8 },
    Block { tier: u8 },
    Flower(FlowerId),
    Player(PlayerId),
}

impl Tile {
    #[must_use]
    pub fn is_empty(self) -> bool {
        matches!(self, Tile::Empty)
    }

    #[must_use]
    pub fn is_block(self) -> bool {
        matches!(self, Tile::Block { .. })
    }

    #[must_use]
    pub fn is_flower(self) -> bool {
        matches!(self, Tile::Flower(_))
    }

    /// Whether placing this tile on the foreground clears grass on the
    /// background of the same cell.
    #[must_use]
    pub fn kills_grass(self) -> bool {
        matches!(self, Tile::Block { .. } | Tile::Flower(_))
    }

    /// Whether a player may remove this tile with a remove action.
    #[must_use]
    pub fn player_can_remove(self) -> bool {
        matches!(self, Tile::Block { .. } | Tile::Flower(_))
    }
}

/// A live flower entity. Owned by the world; referenced from the grid by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flower {
    pub pos: Pos,
    pub creator: PlayerId,
    pub poisonous: bool,
    pub tier: u8,
    pub age: u32,
    pub growth_delay: u32,
}

impl Flower {
    #[must_use]
    pub fn stage(&self) -> u32 {
        (self.age / self.growth_delay).min(SPROUT_STAGE_COUNT)
    }

    /// Sprouts are immature: not walkable, not yet worth points.
    #[must_use]
    pub fn is_sprout(&self) -> bool {
        self.stage() < SPROUT_STAGE_COUNT
    }

    /// Age at which the flower withers and leaves the world.
    #[must_use]
    pub fn max_age(&self) -> u32 {
        self.growth_delay * SPROUT_STAGE_COUNT + FLOWER_MATURE_LIFETIME
    }
}

/// A live player entity (bot or remote human).
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub pos: Pos,
    pub level: u8,
    pub score: u32,
    /// Facing, flipped by horizontal movement. Presentation-only but cheap
    /// to maintain and persisted alongside player state by the outer layer.
    pub flip: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flower(age: u32) -> Flower {
        Flower {
            pos: Pos::new(0, 0),
            creator: PlayerId(1),
            poisonous: false,
            tier: 2,
            age,
            growth_delay: 50,
        }
    }

    #[test]
    fn test_flower_stages() {
        assert!(flower(0).is_sprout());
        assert!(flower(149).is_sprout());
        assert!(!flower(150).is_sprout());
        assert_eq!(flower(10_000).stage(), SPROUT_STAGE_COUNT);
    }

    #[test]
    fn test_flower_max_age() {
        assert_eq!(flower(0).max_age(), 50 * SPROUT_STAGE_COUNT + 600);
    }
}
