//! The autonomous bot controller.
//!
//! Each world tick the bot advances its timers; every few ticks it acts:
//! it re-validates its plan, re-plans when the plan aged out or the
//! terrain under it moved, and then spends the act on exactly one unit of
//! progress: a step, a broken block, or a queued planting.
//!
//! Planning failures are quiet: a mode that finds nothing to do leaves
//! the bot idle for the act and the next re-plan trigger tries again.

use std::collections::VecDeque;

use petalgrid_data::{PlayerId, Pos, CARDINAL_OFFSETS, CLOCKWISE_OFFSETS};
use rand::Rng;

use crate::config::BotConfig;
use crate::path::WalkPath;
use crate::plan::{next_mode, PlanMode};
use crate::planting::can_plant_seed;
use crate::poison::PoisonStrategy;
use crate::search::{scan, ScanResult};
use crate::tile::{Flower, Tile};
use crate::world::World;

/// Most recent hazards received, newest last.
const RECEIVED_HAZARD_CAP: usize = 8;
/// Removal feedback entries kept for strategy rotation.
const REMOVAL_LOG_CAP: usize = 12;
/// Plantable cells collected from one scan before selection.
const SEED_CANDIDATE_CAP: usize = 100;
/// Random pick window over the cheapest plantable cells.
const SEED_PICK_WINDOW: usize = 15;
/// Block cells considered for a destruction plan.
const BLOCK_CANDIDATE_CAP: usize = 15;
/// Cost penalty that ranks own sprouts far below mature flowers when
/// sweeping in Clear mode.
const SPROUT_CLEAR_PENALTY: u32 = 10_000;

#[derive(Debug, Clone, Copy)]
struct ReceivedHazard {
    creator: PlayerId,
    at: f64,
}

#[derive(Debug, Clone, Copy)]
struct RemovalRecord {
    poisonous: bool,
}

/// A queued single-cell action at the end of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantAction {
    pub pos: Pos,
}

pub struct Bot {
    pub id: PlayerId,
    pub config: BotConfig,
    pub mode: PlanMode,
    /// When the bot last (re-)entered Normal mode, in world seconds.
    pub normal_entered_at: f64,
    pub strategy: PoisonStrategy,
    pub walk_path: Option<WalkPath>,
    pub target_action: Option<PlantAction>,
    /// Preferred planting cell, kept so re-plans converge on one spot.
    pub last_seed_pos: Option<Pos>,
    pub plan_age: u32,
    act_delay: u32,
    mode_timer: u32,
    rotation_timer: u32,
    received_hazards: VecDeque<ReceivedHazard>,
    removal_log: VecDeque<RemovalRecord>,
    last_removal_at: Option<f64>,
    poison_ratio: Option<f64>,
    poison_ratio_stale: bool,
}

impl Bot {
    #[must_use]
    pub fn new(id: PlayerId, config: BotConfig, now: f64) -> Self {
        Self {
            id,
            config,
            mode: PlanMode::Normal,
            normal_entered_at: now,
            strategy: PoisonStrategy::Never,
            walk_path: None,
            target_action: None,
            last_seed_pos: None,
            plan_age: 0,
            act_delay: 0,
            mode_timer: 0,
            rotation_timer: 0,
            received_hazards: VecDeque::new(),
            removal_log: VecDeque::new(),
            last_removal_at: None,
            poison_ratio: None,
            poison_ratio_stale: true,
        }
    }

    // ------------------------------------------------------------------
    // Hooks called by the world/driver

    /// Tick entry point: advances the act cadence and acts when due.
    pub fn timer_event<R: Rng>(&mut self, world: &mut World, rng: &mut R) {
        self.poison_ratio_stale = true;
        self.act_delay += 1;
        if self.act_delay >= self.config.act_interval {
            self.act_delay = 0;
            self.act(world, rng);
        }
    }

    /// The bot picked someone's poisonous flower.
    pub fn poison_event(&mut self, creator: PlayerId, now: f64) {
        self.received_hazards.push_back(ReceivedHazard { creator, at: now });
        while self.received_hazards.len() > RECEIVED_HAZARD_CAP {
            self.received_hazards.pop_front();
        }
    }

    /// Someone removed one of the bot's mature flowers. Self-removals are
    /// not feedback and are ignored.
    pub fn flower_removed_event(&mut self, poisonous: bool, removed_by_self: bool, now: f64) {
        if removed_by_self {
            return;
        }
        self.last_removal_at = Some(now);
        self.removal_log.push_back(RemovalRecord { poisonous });
        while self.removal_log.len() > REMOVAL_LOG_CAP {
            self.removal_log.pop_front();
        }
    }

    // ------------------------------------------------------------------
    // The act loop

    fn act<R: Rng>(&mut self, world: &mut World, rng: &mut R) {
        if world.player(self.id).is_none() {
            return;
        }
        self.mode_timer += 1;
        if self.mode_timer >= self.config.mode_eval_interval {
            self.mode_timer = 0;
            self.evaluate_mode(world, rng);
        }
        self.rotation_timer += 1;
        if self.rotation_timer >= self.config.rotation_eval_interval {
            self.rotation_timer = 0;
            self.evaluate_rotation(world, rng);
        }
        if self.should_make_plan(world) {
            self.make_plan(world, rng);
        }
        self.execute_plan(world, rng);
    }

    fn evaluate_mode<R: Rng>(&mut self, world: &World, rng: &mut R) {
        let Some(next) = next_mode(
            self.mode,
            world,
            self.id,
            self.normal_entered_at,
            &self.config,
            rng,
        ) else {
            return;
        };
        if next == PlanMode::Normal {
            self.normal_entered_at = world.now();
        }
        tracing::debug!(bot = self.id.0, from = ?self.mode, to = ?next, "plan mode change");
        self.mode = next;
    }

    /// Rotation policy: long silence reverts to the inert strategy; a full
    /// log of purely benign removals means nobody is getting caught, so a
    /// different strategy gets its turn. Any poisoned rival in the log
    /// keeps the current strategy in place.
    fn evaluate_rotation<R: Rng>(&mut self, world: &World, rng: &mut R) {
        let silent = self
            .last_removal_at
            .is_none_or(|at| world.now() - at > self.config.rotation_silence_seconds);
        if silent {
            if !self.strategy.is_inert() {
                tracing::debug!(bot = self.id.0, "removal silence, reverting poison strategy");
                self.strategy = PoisonStrategy::Never;
            }
            self.removal_log.clear();
            return;
        }
        if self.removal_log.len() >= REMOVAL_LOG_CAP
            && self.removal_log.iter().all(|record| !record.poisonous)
        {
            self.strategy = PoisonStrategy::random(rng, self.config.level);
            self.removal_log.clear();
            tracing::debug!(bot = self.id.0, strategy = ?self.strategy, "rotated poison strategy");
        }
    }

    /// A plan survives until it ages out, its remaining path goes stale,
    /// or it has neither a path nor a queued action left.
    fn should_make_plan(&self, world: &World) -> bool {
        if self.plan_age > self.config.max_plan_age {
            return true;
        }
        if let Some(path) = &self.walk_path {
            return path.is_stale(world);
        }
        self.target_action.is_none()
    }

    fn make_plan<R: Rng>(&mut self, world: &World, rng: &mut R) {
        self.walk_path = None;
        self.target_action = None;
        self.plan_age = 0;
        match self.mode {
            PlanMode::Normal => self.plan_normal(world, rng),
            PlanMode::Clear => self.plan_clear(world),
            PlanMode::Visit(target) => self.plan_visit(world, target),
        }
        if self.target_action.is_none() {
            self.last_seed_pos = None;
        }
    }

    // ------------------------------------------------------------------
    // Memories

    /// Live poison ratio over the bot's own flowers, `None` below three
    /// flowers (too small a sample to steer by). Cached per tick.
    fn poison_ratio(&mut self, world: &World) -> Option<f64> {
        if !self.poison_ratio_stale {
            return self.poison_ratio;
        }
        let mut poisonous = 0usize;
        let mut total = 0usize;
        for (_, flower) in world.flowers() {
            if flower.creator == self.id {
                if flower.poisonous {
                    poisonous += 1;
                }
                total += 1;
            }
        }
        self.poison_ratio = (total >= 3).then(|| poisonous as f64 / total as f64);
        self.poison_ratio_stale = false;
        self.poison_ratio
    }

    /// Whether the bot should assume this flower is poisonous: its own
    /// flowers it knows outright; another creator's flowers stay suspect
    /// for a window after the most recent hazard received from them.
    fn expects_poison(&self, world: &World, flower: &Flower) -> bool {
        if flower.creator == self.id {
            return flower.poisonous;
        }
        let last_hazard = self
            .received_hazards
            .iter()
            .filter(|hazard| hazard.creator == flower.creator)
            .map(|hazard| hazard.at)
            .fold(None::<f64>, |acc, at| Some(acc.map_or(at, |a| a.max(at))));
        last_hazard.is_some_and(|at| at > world.now() - self.config.hazard_memory_seconds)
    }

    // ------------------------------------------------------------------
    // Planning

    fn pos(&self, world: &World) -> Pos {
        world
            .player(self.id)
            .map(|player| player.pos)
            .unwrap_or(Pos::new(0, 0))
    }

    fn plan_normal<R: Rng>(&mut self, world: &World, rng: &mut R) {
        let result = scan(world, self.pos(world), false);

        // Closest mature flower the bot does not expect to be poisoned by.
        let mut unreachable = Vec::new();
        let mut closest: Option<(u32, usize)> = None;
        for (_, flower) in world.flowers() {
            if flower.is_sprout() || self.expects_poison(world, flower) {
                continue;
            }
            match result.cost_at(world, flower.pos) {
                None => unreachable.push(flower.pos),
                Some(cost) => {
                    if closest.is_none_or(|(best, _)| cost < best) {
                        closest = Some((cost, world.index(flower.pos)));
                    }
                }
            }
        }

        // Flowers walled off entirely are worth breaking blocks for.
        if !unreachable.is_empty() && self.make_destructive_flower_path(world, &unreachable) {
            return;
        }
        if let Some((_, index)) = closest {
            self.walk_path = result.walk_path(world, index, false);
            return;
        }

        // Nothing to harvest: go plant.
        if !self.plan_seed_action(world, rng, &result, false) {
            self.make_destructive_seed_path(world, rng);
        }
    }

    fn plan_clear(&mut self, world: &World) {
        let result = scan(world, self.pos(world), false);
        let mut best: Option<(u32, usize)> = None;
        for (_, flower) in world.flowers() {
            if flower.creator != self.id {
                continue;
            }
            let Some(cost) = result.cost_at(world, flower.pos) else {
                continue;
            };
            let weighted = cost + if flower.is_sprout() { SPROUT_CLEAR_PENALTY } else { 0 };
            if best.is_none_or(|(current, _)| weighted < current) {
                best = Some((weighted, world.index(flower.pos)));
            }
        }
        if let Some((_, index)) = best {
            self.walk_path = result.walk_path(world, index, false);
        }
    }

    fn plan_visit(&mut self, world: &World, target: PlayerId) {
        let Some(target_pos) = world.player(target).map(|player| player.pos) else {
            return;
        };
        let origin = self.pos(world);
        let result = scan(world, origin, false);
        if let Some(neighbor) = result.closest_neighbor(world, target_pos) {
            self.walk_path = result.walk_path(world, neighbor, false);
            if self.walk_path.is_some() {
                return;
            }
        }
        let result = scan(world, origin, true);
        if let Some(neighbor) = result.closest_neighbor(world, target_pos) {
            self.walk_path = result.walk_path(world, neighbor, true);
        }
    }

    /// Destructive fallback toward flowers that a non-destructive scan
    /// could not reach at all.
    fn make_destructive_flower_path(&mut self, world: &World, unreachable: &[Pos]) -> bool {
        let result = scan(world, self.pos(world), true);
        let mut best: Option<(u32, usize)> = None;
        for &target in unreachable {
            let Some(cost) = result.cost_at(world, target) else {
                continue;
            };
            if best.is_none_or(|(current, _)| cost < current) {
                best = Some((cost, world.index(target)));
            }
        }
        match best {
            Some((_, index)) => {
                self.walk_path = result.walk_path(world, index, true);
                self.walk_path.is_some()
            }
            None => false,
        }
    }

    fn make_destructive_seed_path<R: Rng>(&mut self, world: &World, rng: &mut R) {
        let result = scan(world, self.pos(world), true);
        if !self.plan_seed_action(world, rng, &result, true) {
            self.plan_block_destruction(world, &result);
        }
    }

    /// Picks a planting cell among the reachable candidates and plans a
    /// walk to its cheapest neighbor plus the queued planting.
    fn plan_seed_action<R: Rng>(
        &mut self,
        world: &World,
        rng: &mut R,
        result: &ScanResult,
        destructive: bool,
    ) -> bool {
        let mut seed_positions = Vec::new();
        for &index in &result.pop_order {
            let pos = world.pos_of(index);
            if can_plant_seed(world, pos) {
                seed_positions.push(pos);
                if seed_positions.len() >= SEED_CANDIDATE_CAP {
                    break;
                }
            }
        }
        if seed_positions.is_empty() {
            return false;
        }
        let Some((pos, neighbor)) = self.select_seed_neighbor(world, rng, result, &seed_positions)
        else {
            return false;
        };
        // A neighbor chain of one cell means the bot already stands there;
        // the queued action alone is the whole plan.
        self.walk_path = result.walk_path(world, neighbor, destructive);
        self.target_action = Some(PlantAction { pos });
        self.last_seed_pos = Some(pos);
        true
    }

    fn select_seed_neighbor<R: Rng>(
        &mut self,
        world: &World,
        rng: &mut R,
        result: &ScanResult,
        seed_positions: &[Pos],
    ) -> Option<(Pos, usize)> {
        // Re-plans prefer the previous planting spot so the bot does not
        // wander between equally good sites.
        if let Some(last) = self.last_seed_pos {
            if seed_positions.contains(&last) {
                if let Some(neighbor) = result.closest_neighbor(world, last) {
                    return Some((last, neighbor));
                }
            }
        }
        // Ratio steering: when the live poison ratio has drifted out of
        // the strategy's band, prefer candidates whose location verdict
        // pulls it back in.
        if let Some(ratio) = self.poison_ratio(world) {
            if ratio < self.strategy.min_ratio() {
                if let Some(found) =
                    self.select_neighbor_by_verdict(world, rng, result, seed_positions, true)
                {
                    return Some(found);
                }
            } else if ratio > self.strategy.max_ratio() {
                if let Some(found) =
                    self.select_neighbor_by_verdict(world, rng, result, seed_positions, false)
                {
                    return Some(found);
                }
            }
        }
        self.select_seed_neighbor_any(world, rng, result, seed_positions)
    }

    fn select_neighbor_by_verdict<R: Rng>(
        &mut self,
        world: &World,
        rng: &mut R,
        result: &ScanResult,
        seed_positions: &[Pos],
        wanted: bool,
    ) -> Option<(Pos, usize)> {
        let candidates: Vec<Pos> = {
            let strategy = &self.strategy;
            seed_positions
                .iter()
                .copied()
                .filter(|&pos| strategy.location_verdict(world, self.id, pos) == Some(wanted))
                .collect()
        };
        self.select_seed_neighbor_any(world, rng, result, &candidates)
    }

    /// Random pick among the cheapest candidates, falling back to a linear
    /// sweep when the pick has no reachable neighbor.
    fn select_seed_neighbor_any<R: Rng>(
        &mut self,
        world: &World,
        rng: &mut R,
        result: &ScanResult,
        seed_positions: &[Pos],
    ) -> Option<(Pos, usize)> {
        if seed_positions.is_empty() {
            return None;
        }
        let window = seed_positions.len().min(SEED_PICK_WINDOW);
        let pick = seed_positions[rng.gen_range(0..window)];
        if let Some(neighbor) = result.closest_neighbor(world, pick) {
            return Some((pick, neighbor));
        }
        for &pos in seed_positions {
            if let Some(neighbor) = result.closest_neighbor(world, pos) {
                return Some((pos, neighbor));
            }
        }
        None
    }

    /// Plans a destructive walk to the block whose removal opens up the
    /// most ground, discounted by distance.
    fn plan_block_destruction(&mut self, world: &World, result: &ScanResult) {
        let mut block_indexes = Vec::new();
        for &index in &result.pop_order {
            if world.foreground(world.pos_of(index)).is_block() {
                block_indexes.push(index);
                if block_indexes.len() >= BLOCK_CANDIDATE_CAP {
                    break;
                }
            }
        }
        let mut best: Option<(i64, usize)> = None;
        for &index in &block_indexes {
            let pos = world.pos_of(index);
            let mut open_neighbors = 0i64;
            for offset in CLOCKWISE_OFFSETS {
                if world
                    .foreground_safe(pos.add(offset))
                    .is_some_and(|tile| !tile.is_block())
                {
                    open_neighbors += 1;
                }
            }
            let cost = result.node(index).and_then(|node| node.cost).unwrap_or(0) as i64;
            let score = 2 * open_neighbors - cost;
            if best.is_none_or(|(current, _)| score > current) {
                best = Some((score, index));
            }
        }
        if let Some((_, index)) = best {
            self.walk_path = result.walk_path(world, index, true);
        }
    }

    // ------------------------------------------------------------------
    // Execution

    fn execute_plan<R: Rng>(&mut self, world: &mut World, rng: &mut R) {
        self.plan_age += 1;
        if self.walk_path.is_some() {
            // Occasionally spend the act off-path: a defensive block or an
            // opportunistic seed right next to the bot.
            if rng.gen_bool(self.config.off_path_action_chance) {
                if world.center_block_count() < self.config.center_block_cap
                    && self.place_block_next_to_path(world, rng)
                {
                    return;
                }
                if self.plant_seed_next_to_path(world, rng) {
                    return;
                }
            }
            self.take_walk_step(world);
        } else if let Some(action) = self.target_action.take() {
            self.perform_plant(world, rng, action);
        }
    }

    fn take_walk_step(&mut self, world: &mut World) {
        let pos = self.pos(world);
        let (offset, destructive) = {
            let Some(path) = self.walk_path.as_ref() else {
                return;
            };
            (path.walk_offset(pos), path.destructive)
        };
        let Some(offset) = offset else {
            return;
        };
        let next = pos.add(offset);
        let next_tile = world.foreground(next);
        if destructive && next_tile.is_block() {
            world.remove_tile(self.id, offset);
            return;
        }
        if let Tile::Flower(flower_id) = next_tile {
            if let Some(flower) = world.flower(flower_id) {
                let clearing_own = self.mode == PlanMode::Clear && flower.creator == self.id;
                if clearing_own {
                    if flower.is_sprout() {
                        // Sprouts cannot be walked over; sweep it directly.
                        world.remove_tile(self.id, offset);
                        return;
                    }
                } else if self.expects_poison(world, flower) {
                    // Hold position rather than pick a suspect flower; the
                    // plan ages out if the situation does not change.
                    return;
                }
            }
        }
        world.walk(self.id, offset);
        let landed = self.pos(world);
        if let Some(path) = self.walk_path.as_mut() {
            if path.advance(landed) {
                self.walk_path = None;
            }
        }
    }

    fn perform_plant<R: Rng>(&mut self, world: &mut World, rng: &mut R, action: PlantAction) {
        if !can_plant_seed(world, action.pos) {
            return;
        }
        let Some(offset) = self.pos(world).step_toward(action.pos) else {
            return;
        };
        self.plant_seed(world, rng, offset);
    }

    fn plant_seed<R: Rng>(&mut self, world: &mut World, rng: &mut R, offset: Pos) {
        let pos = self.pos(world);
        let target = pos.add(offset);
        let poisonous = self
            .strategy
            .should_plant_poison(world, self.id, pos, target);
        let tier = if poisonous { self.strategy.poison_tier() } else { None };
        world.build_sprout(self.id, offset, poisonous, tier, rng);
        self.strategy.plant_event(rng);
        self.poison_ratio_stale = true;
        tracing::trace!(
            bot = self.id.0,
            x = target.x,
            y = target.y,
            poisonous,
            "planted seed"
        );
    }

    /// A random cardinal neighbor of the bot, rejected when it is the next
    /// path cell or out of bounds.
    fn pos_next_to_path<R: Rng>(&self, world: &World, rng: &mut R) -> Option<(Pos, Pos)> {
        let next_path_pos = self.walk_path.as_ref()?.next_step().pos;
        let offset = CARDINAL_OFFSETS[rng.gen_range(0..CARDINAL_OFFSETS.len())];
        let pos = self.pos(world).add(offset);
        if !world.in_bounds(pos) || pos == next_path_pos {
            return None;
        }
        Some((pos, offset))
    }

    fn place_block_next_to_path<R: Rng>(&mut self, world: &mut World, rng: &mut R) -> bool {
        let Some((pos, offset)) = self.pos_next_to_path(world, rng) else {
            return false;
        };
        if world.is_edge(pos) || !world.foreground(pos).is_empty() {
            return false;
        }
        let tier = rng.gen_range(0..self.config.level);
        world.build_block(self.id, offset, tier);
        true
    }

    /// Off-path planting also honors ratio steering: a verdict that would
    /// push the ratio further out of band is refused.
    fn plant_seed_next_to_path<R: Rng>(&mut self, world: &mut World, rng: &mut R) -> bool {
        let Some((pos, offset)) = self.pos_next_to_path(world, rng) else {
            return false;
        };
        if !can_plant_seed(world, pos) {
            return false;
        }
        if let Some(ratio) = self.poison_ratio(world) {
            let own_pos = self.pos(world);
            let poisonous = self
                .strategy
                .should_plant_poison(world, self.id, own_pos, pos);
            if ratio < self.strategy.min_ratio() && !poisonous {
                return false;
            }
            if ratio > self.strategy.max_ratio() && poisonous {
                return false;
            }
        }
        self.plant_seed(world, rng, offset);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (World, ChaCha8Rng) {
        (
            World::new(WorldConfig::default()),
            ChaCha8Rng::seed_from_u64(21),
        )
    }

    fn spawn_bot(world: &mut World, rng: &mut ChaCha8Rng, pos: Pos) -> Bot {
        let id = world.add_player("bot", 7, pos, rng);
        Bot::new(id, BotConfig::default(), world.now())
    }

    #[test]
    fn test_plan_normal_targets_nearest_mature_flower() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let rival = world.add_player("rival", 7, Pos::new(22, 22), &mut rng);
        world.spawn_flower(Pos::new(3, 8), rival, false, 1, 200, 50).unwrap();
        world.spawn_flower(Pos::new(20, 3), rival, false, 1, 200, 50).unwrap();
        bot.make_plan(&mut world, &mut rng);
        let path = bot.walk_path.as_ref().expect("planned a path");
        let last = path.steps().last().unwrap().pos;
        assert_eq!(last, Pos::new(3, 8));
        assert!(!path.destructive);
    }

    #[test]
    fn test_plan_normal_skips_sprouts_and_suspects() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let rival = world.add_player("rival", 7, Pos::new(22, 22), &mut rng);
        // A sprout nearby and a suspect mature flower: neither qualifies.
        world.spawn_flower(Pos::new(3, 6), rival, false, 1, 0, 50).unwrap();
        world.spawn_flower(Pos::new(3, 9), rival, true, 1, 200, 50).unwrap();
        bot.poison_event(rival, world.now());
        bot.make_plan(&mut world, &mut rng);
        if let Some(path) = bot.walk_path.as_ref() {
            let last = path.steps().last().unwrap().pos;
            assert_ne!(last, Pos::new(3, 6));
            assert_ne!(last, Pos::new(3, 9));
        }
    }

    #[test]
    fn test_plan_normal_breaks_toward_walled_flower() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let rival = world.add_player("rival", 7, Pos::new(22, 22), &mut rng);
        // Wall the flower into a 3x3 box.
        let center = Pos::new(12, 12);
        for offset in CLOCKWISE_OFFSETS {
            world.set_foreground(center.add(offset), Tile::Block { tier: 0 });
        }
        world
            .spawn_flower(center, rival, false, 1, 200, 50)
            .unwrap();
        bot.make_plan(&mut world, &mut rng);
        let path = bot.walk_path.as_ref().expect("planned a destructive path");
        assert!(path.destructive);
        assert_eq!(path.steps().last().unwrap().pos, center);
    }

    #[test]
    fn test_plan_without_flowers_queues_planting() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        bot.make_plan(&mut world, &mut rng);
        let action = bot.target_action.expect("queued a plant action");
        assert!(can_plant_seed(&world, action.pos));
        assert_eq!(bot.last_seed_pos, Some(action.pos));
    }

    #[test]
    fn test_replans_prefer_last_seed_pos() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        bot.make_plan(&mut world, &mut rng);
        let first = bot.target_action.expect("queued a plant action").pos;
        for _ in 0..5 {
            bot.make_plan(&mut world, &mut rng);
            assert_eq!(bot.target_action.unwrap().pos, first);
        }
    }

    #[test]
    fn test_ratio_steering_forces_poison_candidates() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        // Three own benign sprouts in a far corner: ratio 0.0, below band.
        for (x, y) in [(20, 20), (20, 24), (24, 20)] {
            world
                .spawn_flower(Pos::new(x, y), bot.id, false, 0, 0, 50)
                .unwrap();
        }
        // Blocks near the bot so block-adjacent candidates exist.
        world.set_foreground(Pos::new(6, 6), Tile::Block { tier: 0 });
        bot.strategy = PoisonStrategy::BlockAdjacency { next_to: true };
        for _ in 0..10 {
            bot.last_seed_pos = None;
            bot.make_plan(&mut world, &mut rng);
            let action = bot.target_action.expect("queued a plant action");
            assert_eq!(
                bot.strategy.location_verdict(&world, bot.id, action.pos),
                Some(true),
                "steering must choose a poison-verdict cell at {:?}",
                action.pos
            );
        }
    }

    #[test]
    fn test_clear_prefers_mature_over_closer_sprout() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        bot.mode = PlanMode::Clear;
        world.spawn_flower(Pos::new(3, 5), bot.id, false, 1, 0, 50).unwrap();
        world
            .spawn_flower(Pos::new(3, 15), bot.id, true, 1, 200, 50)
            .unwrap();
        bot.make_plan(&mut world, &mut rng);
        let path = bot.walk_path.as_ref().expect("planned a sweep path");
        assert_eq!(path.steps().last().unwrap().pos, Pos::new(3, 15));
    }

    #[test]
    fn test_visit_plans_toward_target() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let other = world.add_player("other", 7, Pos::new(20, 20), &mut rng);
        bot.mode = PlanMode::Visit(other);
        bot.make_plan(&mut world, &mut rng);
        let path = bot.walk_path.as_ref().expect("planned a visit path");
        let last = path.steps().last().unwrap().pos;
        assert_eq!(last.chebyshev(Pos::new(20, 20)), 1);
    }

    #[test]
    fn test_stale_path_triggers_replan() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let rival = world.add_player("rival", 7, Pos::new(22, 22), &mut rng);
        world.spawn_flower(Pos::new(3, 10), rival, false, 1, 200, 50).unwrap();
        bot.make_plan(&mut world, &mut rng);
        assert!(!bot.should_make_plan(&world));
        // A wall lands on the remaining path.
        world.set_foreground(Pos::new(3, 7), Tile::Block { tier: 0 });
        assert!(bot.should_make_plan(&world));
    }

    #[test]
    fn test_plan_ages_out() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let rival = world.add_player("rival", 7, Pos::new(22, 22), &mut rng);
        world.spawn_flower(Pos::new(20, 3), rival, false, 1, 200, 50).unwrap();
        bot.make_plan(&mut world, &mut rng);
        bot.plan_age = bot.config.max_plan_age + 1;
        assert!(bot.should_make_plan(&world));
    }

    #[test]
    fn test_refuses_step_onto_suspect_flower() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let rival = world.add_player("rival", 7, Pos::new(22, 22), &mut rng);
        let bot_pos = world.player(bot.id).unwrap().pos;
        let flower_pos = bot_pos.add(Pos::new(0, 1));
        world
            .spawn_flower(flower_pos, rival, true, 1, 200, 50)
            .unwrap();
        // Path that crosses the flower cell.
        let cells = vec![bot_pos, flower_pos, flower_pos.add(Pos::new(0, 1))];
        bot.walk_path = Some(WalkPath::new(&world, cells, false));
        bot.poison_event(rival, world.now());
        bot.take_walk_step(&mut world);
        // The bot held position instead of harvesting the trap.
        assert_eq!(world.player(bot.id).unwrap().pos, bot_pos);
        assert!(world.foreground(flower_pos).is_flower());
    }

    #[test]
    fn test_clear_mode_sweeps_own_poison() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        bot.mode = PlanMode::Clear;
        let bot_pos = world.player(bot.id).unwrap().pos;
        let flower_pos = bot_pos.add(Pos::new(0, 1));
        world
            .spawn_flower(flower_pos, bot.id, true, 1, 200, 50)
            .unwrap();
        let cells = vec![bot_pos, flower_pos];
        bot.walk_path = Some(WalkPath::new(&world, cells, false));
        bot.take_walk_step(&mut world);
        // Walking onto the mature flower harvested it.
        assert!(world.foreground(flower_pos) == Tile::Player(bot.id));
    }

    #[test]
    fn test_rotation_reverts_on_silence() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        bot.strategy = PoisonStrategy::BlockAdjacency { next_to: true };
        bot.flower_removed_event(false, false, world.now());
        // Within the window the strategy survives.
        bot.evaluate_rotation(&world, &mut rng);
        assert!(!bot.strategy.is_inert());
        // Fast-forward past the silence window.
        for _ in 0..6100 {
            world.tick(&mut rng);
        }
        bot.evaluate_rotation(&world, &mut rng);
        assert!(bot.strategy.is_inert());
        assert!(bot.removal_log.is_empty());
    }

    #[test]
    fn test_rotation_on_full_benign_log() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        bot.strategy = PoisonStrategy::Never;
        for _ in 0..REMOVAL_LOG_CAP {
            bot.flower_removed_event(false, false, world.now());
        }
        bot.evaluate_rotation(&world, &mut rng);
        assert!(!bot.strategy.is_inert());
        assert!(bot.removal_log.is_empty());
    }

    #[test]
    fn test_rotation_keeps_strategy_that_catches() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let strategy = PoisonStrategy::GrassAdjacency { next_to: true };
        bot.strategy = strategy.clone();
        for index in 0..REMOVAL_LOG_CAP {
            bot.flower_removed_event(index == 0, false, world.now());
        }
        bot.evaluate_rotation(&world, &mut rng);
        assert_eq!(bot.strategy, strategy);
        assert_eq!(bot.removal_log.len(), REMOVAL_LOG_CAP);
    }

    #[test]
    fn test_received_hazards_bounded() {
        let (mut world, mut rng) = setup();
        let mut bot = spawn_bot(&mut world, &mut rng, Pos::new(3, 3));
        let rival = world.add_player("rival", 7, Pos::new(22, 22), &mut rng);
        for _ in 0..20 {
            bot.poison_event(rival, world.now());
        }
        assert_eq!(bot.received_hazards.len(), RECEIVED_HAZARD_CAP);
    }
}
