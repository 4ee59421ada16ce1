//! Adversarial planting policies.
//!
//! A bot carries exactly one strategy at a time, swapped out by the
//! rotation logic in the controller. Strategies are a tagged variant with
//! their random parameters fixed at construction; dispatch is a plain
//! `match`, no trait objects.
//!
//! Two verdict surfaces exist on purpose. `location_verdict` answers "is
//! this cell a poison cell" for strategies whose decision is intrinsic to
//! the position, and is what ratio steering filters candidates with.
//! `should_plant_poison` is the final call at planting time and also
//! covers the strategies whose decision depends on internal counters or
//! the bot's own position rather than the candidate cell.

use petalgrid_data::{PlayerId, Pos, CARDINAL_OFFSETS};
use rand::Rng;

use crate::tile::Tile;
use crate::world::World;

/// Chebyshev radius within which a cell counts as "close" to a player.
const PLAYER_PROXIMITY_RADIUS: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoisonStrategy {
    /// The inert default: never poison anything.
    Never,
    /// Poison on a randomized cadence of plantings.
    Periodic { delay: u32, max_delay: u32 },
    /// Poison near (or away from) the first other player.
    PlayerProximity { close: bool },
    /// Poison next to (or away from) blocks.
    BlockAdjacency { next_to: bool },
    /// Poison next to (or away from) background grass.
    GrassAdjacency { next_to: bool },
    /// Poison only in one fixed cardinal direction from the bot.
    DirectionFixed { offset: Pos },
    /// Poison a random subset of plantings at one high power tier.
    TierBiased { next_is_poison: bool, tier: u8 },
}

impl PoisonStrategy {
    /// Draws one of the six active strategies uniformly, rolling its
    /// construction-time parameters.
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R, level: u8) -> Self {
        match rng.gen_range(0..6) {
            0 => PoisonStrategy::Periodic {
                delay: 0,
                max_delay: 1 + rng.gen_range(0..5),
            },
            1 => PoisonStrategy::PlayerProximity {
                close: rng.gen_bool(0.5),
            },
            2 => PoisonStrategy::BlockAdjacency {
                next_to: rng.gen_bool(0.5),
            },
            3 => PoisonStrategy::GrassAdjacency {
                next_to: rng.gen_bool(0.5),
            },
            4 => PoisonStrategy::DirectionFixed {
                offset: CARDINAL_OFFSETS[rng.gen_range(0..CARDINAL_OFFSETS.len())],
            },
            _ => {
                let min_tier = 3.min(level.saturating_sub(1));
                PoisonStrategy::TierBiased {
                    next_is_poison: false,
                    tier: min_tier + rng.gen_range(0..level.saturating_sub(min_tier).max(1)),
                }
            }
        }
    }

    #[must_use]
    pub fn is_inert(&self) -> bool {
        matches!(self, PoisonStrategy::Never)
    }

    /// Position-intrinsic verdict for `pos`, or `None` when this strategy
    /// does not judge cells by location. Ratio steering only considers
    /// strategies that answer here.
    #[must_use]
    pub fn location_verdict(&self, world: &World, bot: PlayerId, pos: Pos) -> Option<bool> {
        match self {
            PoisonStrategy::Never => Some(false),
            PoisonStrategy::PlayerProximity { close } => {
                let verdict = world
                    .other_players(bot)
                    .next()
                    .map(|player| (pos.chebyshev(player.pos) < PLAYER_PROXIMITY_RADIUS) == *close);
                Some(verdict.unwrap_or(false))
            }
            PoisonStrategy::BlockAdjacency { next_to } => {
                let beside_block = CARDINAL_OFFSETS.iter().any(|&offset| {
                    world
                        .foreground_safe(pos.add(offset))
                        .is_some_and(Tile::is_block)
                });
                Some(beside_block == *next_to)
            }
            PoisonStrategy::GrassAdjacency { next_to } => {
                let beside_grass = CARDINAL_OFFSETS.iter().any(|&offset| {
                    let neighbor = pos.add(offset);
                    world.in_bounds(neighbor)
                        && matches!(world.background(neighbor), Tile::Grass { .. })
                });
                Some(beside_grass == *next_to)
            }
            PoisonStrategy::Periodic { .. }
            | PoisonStrategy::DirectionFixed { .. }
            | PoisonStrategy::TierBiased { .. } => None,
        }
    }

    /// Final planting-time decision for a seed going into `pos` while the
    /// bot stands at `bot_pos`.
    #[must_use]
    pub fn should_plant_poison(
        &self,
        world: &World,
        bot: PlayerId,
        bot_pos: Pos,
        pos: Pos,
    ) -> bool {
        match self {
            PoisonStrategy::Periodic { delay, .. } => *delay == 0,
            PoisonStrategy::DirectionFixed { offset } => pos.sub(bot_pos) == *offset,
            PoisonStrategy::TierBiased { next_is_poison, .. } => *next_is_poison,
            _ => self.location_verdict(world, bot, pos).unwrap_or(false),
        }
    }

    /// Power tier for a poisonous planting; `None` lets the world draw a
    /// random tier.
    #[must_use]
    pub fn poison_tier(&self) -> Option<u8> {
        match self {
            PoisonStrategy::TierBiased { tier, .. } => Some(*tier),
            _ => None,
        }
    }

    /// Advances internal counters after any planting decision.
    pub fn plant_event<R: Rng>(&mut self, rng: &mut R) {
        match self {
            PoisonStrategy::Periodic { delay, max_delay } => {
                *delay += 1;
                if *delay > *max_delay {
                    *delay = 0;
                }
            }
            PoisonStrategy::TierBiased { next_is_poison, .. } => {
                *next_is_poison = rng.gen_bool(0.25);
            }
            _ => {}
        }
    }

    /// Lower bound of the acceptable live poison ratio.
    #[must_use]
    pub fn min_ratio(&self) -> f64 {
        match self {
            PoisonStrategy::Never => 0.0,
            _ => 0.2,
        }
    }

    /// Upper bound of the acceptable live poison ratio.
    #[must_use]
    pub fn max_ratio(&self) -> f64 {
        0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world_and_rng() -> (World, ChaCha8Rng) {
        (
            World::new(WorldConfig::default()),
            ChaCha8Rng::seed_from_u64(11),
        )
    }

    #[test]
    fn test_periodic_fires_on_cadence() {
        let (world, mut rng) = world_and_rng();
        let mut strategy = PoisonStrategy::Periodic {
            delay: 0,
            max_delay: 2,
        };
        let origin = Pos::new(1, 1);
        let mut verdicts = Vec::new();
        for _ in 0..6 {
            verdicts.push(strategy.should_plant_poison(&world, PlayerId(0), origin, origin));
            strategy.plant_event(&mut rng);
        }
        assert_eq!(verdicts, vec![true, false, false, true, false, false]);
        assert_eq!(strategy.location_verdict(&world, PlayerId(0), origin), None);
    }

    #[test]
    fn test_player_proximity_uses_first_other_player() {
        let (mut world, mut rng) = world_and_rng();
        let bot = world.add_player("bot", 7, Pos::new(3, 3), &mut rng);
        let other = world.add_player("other", 7, Pos::new(10, 10), &mut rng);
        let other_pos = world.player(other).unwrap().pos;
        let strategy = PoisonStrategy::PlayerProximity { close: true };
        assert_eq!(
            strategy.location_verdict(&world, bot, other_pos.add(Pos::new(1, 1))),
            Some(true)
        );
        assert_eq!(
            strategy.location_verdict(&world, bot, Pos::new(20, 20)),
            Some(false)
        );
        // No other players at all: never a poison cell.
        let lonely = PoisonStrategy::PlayerProximity { close: false };
        world.remove_player(other);
        assert_eq!(
            lonely.location_verdict(&world, bot, Pos::new(20, 20)),
            Some(false)
        );
    }

    #[test]
    fn test_block_adjacency_verdicts() {
        let (mut world, _) = world_and_rng();
        world.set_foreground(Pos::new(5, 5), Tile::Block { tier: 0 });
        let beside = Pos::new(5, 6);
        let far = Pos::new(12, 12);
        let near_strategy = PoisonStrategy::BlockAdjacency { next_to: true };
        let away_strategy = PoisonStrategy::BlockAdjacency { next_to: false };
        assert_eq!(
            near_strategy.location_verdict(&world, PlayerId(0), beside),
            Some(true)
        );
        assert_eq!(
            near_strategy.location_verdict(&world, PlayerId(0), far),
            Some(false)
        );
        assert_eq!(
            away_strategy.location_verdict(&world, PlayerId(0), beside),
            Some(false)
        );
        assert_eq!(
            away_strategy.location_verdict(&world, PlayerId(0), far),
            Some(true)
        );
    }

    #[test]
    fn test_direction_fixed_matches_single_offset() {
        let (world, _) = world_and_rng();
        let strategy = PoisonStrategy::DirectionFixed {
            offset: Pos::new(0, 1),
        };
        let bot_pos = Pos::new(4, 4);
        assert!(strategy.should_plant_poison(&world, PlayerId(0), bot_pos, Pos::new(4, 5)));
        assert!(!strategy.should_plant_poison(&world, PlayerId(0), bot_pos, Pos::new(4, 3)));
        assert!(!strategy.should_plant_poison(&world, PlayerId(0), bot_pos, Pos::new(5, 4)));
    }

    #[test]
    fn test_tier_biased_reports_fixed_tier() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let strategy = PoisonStrategy::random(&mut rng, 7);
            if let PoisonStrategy::TierBiased { tier, .. } = strategy {
                assert!((3..7).contains(&tier));
                assert_eq!(strategy.poison_tier(), Some(tier));
            } else {
                assert_eq!(strategy.poison_tier(), None);
            }
        }
    }

    #[test]
    fn test_ratio_band_defaults() {
        assert_eq!(PoisonStrategy::Never.min_ratio(), 0.0);
        let active = PoisonStrategy::BlockAdjacency { next_to: true };
        assert_eq!(active.min_ratio(), 0.2);
        assert_eq!(active.max_ratio(), 0.8);
    }
}
