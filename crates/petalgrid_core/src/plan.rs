//! High-level objectives and the transitions between them.
//!
//! The mode machine runs on its own cadence, independent of plan
//! re-computation: a bot harvests and plants normally, periodically
//! sweeps its own flowers off the board before rivals can take them, and
//! then pays another player a visit before settling back down.

use petalgrid_data::PlayerId;
use rand::Rng;

use crate::config::BotConfig;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    /// Pursue and harvest flowers, plant seeds, keep busy.
    Normal,
    /// Harvest the bot's own live flowers before others can.
    Clear,
    /// Seek out another player's neighborhood.
    Visit(PlayerId),
}

/// Computes the next mode, or `None` to stay put. Transitions into
/// `Normal` are the caller's cue to restamp the Normal-entry time.
pub fn next_mode<R: Rng>(
    mode: PlanMode,
    world: &World,
    bot: PlayerId,
    normal_entered_at: f64,
    config: &BotConfig,
    rng: &mut R,
) -> Option<PlanMode> {
    match mode {
        PlanMode::Normal => {
            let dwelled = world.now() - normal_entered_at > config.normal_dwell_seconds;
            let company = world.other_players(bot).next().is_some();
            (dwelled && company).then_some(PlanMode::Clear)
        }
        PlanMode::Clear => {
            let others: Vec<PlayerId> = world.other_players(bot).map(|player| player.id).collect();
            if others.is_empty() {
                return Some(PlanMode::Normal);
            }
            let holding_benign = world
                .flowers()
                .any(|(_, flower)| flower.creator == bot && !flower.poisonous);
            if holding_benign {
                return None;
            }
            let target = others[rng.gen_range(0..others.len())];
            Some(PlanMode::Visit(target))
        }
        PlanMode::Visit(target) => {
            let Some(target_pos) = world.player(target).map(|player| player.pos) else {
                return Some(PlanMode::Normal);
            };
            let bot_pos = world.player(bot)?.pos;
            (bot_pos.chebyshev(target_pos) < config.visit_radius).then_some(PlanMode::Normal)
        }
    }
}
