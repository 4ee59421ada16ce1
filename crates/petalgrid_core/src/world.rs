//! The shared world grid.
//!
//! Two tile layers over a square grid, plus the entity maps, maintained
//! counters, and the bounded change feed consumers poll. Everything the
//! planner reads or mutates goes through this context object; there is no
//! process-wide state, which keeps the engine testable in isolation.
//!
//! The simulation is single-threaded and cooperative: `tick` and every
//! player mutator run to completion synchronously. Mutators are no-ops
//! when their preconditions fail; callers do not need to distinguish
//! "failed" from "redundant".

use std::collections::{BTreeMap, VecDeque};

use petalgrid_data::{FlowerId, PlayerId, Pos};
use rand::Rng;

use crate::config::WorldConfig;
use crate::tile::{Flower, PlayerState, Tile, GRASS_TEXTURE_COUNT, SPROUT_STAGE_COUNT, TIER_COUNT};

/// Capacity of the change-feed ring.
const CHANGE_FEED_CAPACITY: usize = 1000;

/// Score charged for planting a sprout.
const SPROUT_BUILD_COST: u32 = 1;
/// Score charged for destroying someone's sprout.
const SPROUT_REMOVAL_PENALTY: u32 = 5;
/// Score lost by whoever picks a poisonous flower.
const POISON_FLOWER_PENALTY: u32 = 20;

const GRASS_CODE_BASE: u16 = 1;
const BLOCK_CODE_BASE: u16 = GRASS_CODE_BASE + GRASS_TEXTURE_COUNT as u16;
const SPROUT_CODE_BASE: u16 = BLOCK_CODE_BASE + TIER_COUNT as u16;
const FLOWER_CODE_BASE: u16 = SPROUT_CODE_BASE + SPROUT_STAGE_COUNT as u16;

/// One entry of the change feed: a cell whose visible type changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldChange {
    pub id: u64,
    pub foreground: bool,
    pub pos: Pos,
    pub code: u16,
}

/// Notifications produced by removal logic, drained by the driver and
/// routed to the affected bots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// A mature flower left the world through a player's remove action.
    FlowerRemoved {
        creator: PlayerId,
        remover: PlayerId,
        poisonous: bool,
    },
    /// A player picked a poisonous flower.
    Poisoned { victim: PlayerId, creator: PlayerId },
}

pub struct World {
    config: WorldConfig,
    size: i32,
    foreground: Vec<Tile>,
    background: Vec<Tile>,
    flowers: BTreeMap<FlowerId, Flower>,
    players: BTreeMap<PlayerId, PlayerState>,
    next_flower_id: u64,
    next_player_id: u32,
    empty_foreground_count: usize,
    grass_count: usize,
    center_block_count: usize,
    changes: VecDeque<WorldChange>,
    last_change_id: u64,
    events: Vec<WorldEvent>,
    tick: u64,
    now: f64,
}

impl World {
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let size = config.size;
        let len = (size * size) as usize;
        Self {
            config,
            size,
            foreground: vec![Tile::Empty; len],
            background: vec![Tile::Empty; len],
            flowers: BTreeMap::new(),
            players: BTreeMap::new(),
            next_flower_id: 0,
            next_player_id: 0,
            empty_foreground_count: len,
            grass_count: 0,
            center_block_count: 0,
            changes: VecDeque::new(),
            last_change_id: 0,
            events: Vec::new(),
            tick: 0,
            now: 0.0,
        }
    }

    // ------------------------------------------------------------------
    // Geometry

    #[must_use]
    pub fn size(&self) -> i32 {
        self.size
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.foreground.len()
    }

    #[must_use]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.x < self.size && pos.y >= 0 && pos.y < self.size
    }

    #[must_use]
    pub fn is_edge(&self, pos: Pos) -> bool {
        pos.x <= 0 || pos.x >= self.size - 1 || pos.y <= 0 || pos.y >= self.size - 1
    }

    #[must_use]
    pub fn index(&self, pos: Pos) -> usize {
        (pos.x + pos.y * self.size) as usize
    }

    #[must_use]
    pub fn pos_of(&self, index: usize) -> Pos {
        Pos::new(index as i32 % self.size, index as i32 / self.size)
    }

    // ------------------------------------------------------------------
    // Tile access

    #[must_use]
    pub fn foreground(&self, pos: Pos) -> Tile {
        self.foreground[self.index(pos)]
    }

    #[must_use]
    pub fn background(&self, pos: Pos) -> Tile {
        self.background[self.index(pos)]
    }

    /// Foreground tile, or `None` when out of bounds.
    #[must_use]
    pub fn foreground_safe(&self, pos: Pos) -> Option<Tile> {
        self.in_bounds(pos).then(|| self.foreground(pos))
    }

    #[must_use]
    pub fn flower(&self, id: FlowerId) -> Option<&Flower> {
        self.flowers.get(&id)
    }

    pub fn flowers(&self) -> impl Iterator<Item = (FlowerId, &Flower)> {
        self.flowers.iter().map(|(id, flower)| (*id, flower))
    }

    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn other_players(&self, id: PlayerId) -> impl Iterator<Item = &PlayerState> {
        self.players.values().filter(move |player| player.id != id)
    }

    #[must_use]
    pub fn center_block_count(&self) -> usize {
        self.center_block_count
    }

    #[must_use]
    pub fn grass_count(&self) -> usize {
        self.grass_count
    }

    #[must_use]
    pub fn empty_foreground_count(&self) -> usize {
        self.empty_foreground_count
    }

    /// Simulated seconds since world creation.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Whether a player can step onto this tile: empty ground, or a mature
    /// flower (stepping on it harvests it).
    #[must_use]
    pub fn can_walk_on(&self, tile: Tile) -> bool {
        match tile {
            Tile::Empty => true,
            Tile::Flower(id) => self.flowers.get(&id).is_some_and(|f| !f.is_sprout()),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Change feed

    /// Display type code of a tile, distinguishing sprout stages and tiers
    /// the way clients render them. Player tiles read as empty ground;
    /// players are published through the registry instead.
    #[must_use]
    pub fn type_code(&self, tile: Tile) -> u16 {
        match tile {
            Tile::Empty | Tile::Player(_) => 0,
            Tile::Grass { texture } => GRASS_CODE_BASE + texture as u16,
            Tile::Block { tier } => BLOCK_CODE_BASE + tier as u16,
            Tile::Flower(id) => match self.flowers.get(&id) {
                Some(flower) if flower.is_sprout() => SPROUT_CODE_BASE + flower.stage() as u16,
                Some(flower) => FLOWER_CODE_BASE + flower.tier as u16,
                None => 0,
            },
        }
    }

    fn push_change(&mut self, foreground: bool, pos: Pos, code: u16) {
        self.last_change_id += 1;
        self.changes.push_back(WorldChange {
            id: self.last_change_id,
            foreground,
            pos,
            code,
        });
        while self.changes.len() > CHANGE_FEED_CAPACITY {
            self.changes.pop_front();
        }
    }

    #[must_use]
    pub fn last_change_id(&self) -> u64 {
        self.last_change_id
    }

    /// All changes with ids at or above `start_id`, oldest first, or `None`
    /// when the ring was overrun and the caller must resynchronize from a
    /// full snapshot.
    #[must_use]
    pub fn changes_since(&self, start_id: u64) -> Option<Vec<WorldChange>> {
        if self.last_change_id.saturating_sub(start_id) > (CHANGE_FEED_CAPACITY - 5) as u64 {
            return None;
        }
        Some(
            self.changes
                .iter()
                .filter(|change| change.id >= start_id)
                .copied()
                .collect(),
        )
    }

    // ------------------------------------------------------------------
    // Tile mutation primitives

    fn add_event(&mut self, foreground: bool, tile: Tile, pos: Pos) {
        if foreground && tile.kills_grass() && matches!(self.background(pos), Tile::Grass { .. }) {
            self.set_background(pos, Tile::Empty);
        }
        match tile {
            Tile::Empty => {
                if foreground {
                    self.empty_foreground_count += 1;
                }
            }
            Tile::Grass { .. } => self.grass_count += 1,
            Tile::Block { .. } => {
                if !self.is_edge(pos) {
                    self.center_block_count += 1;
                }
            }
            Tile::Flower(id) => {
                if let Some(flower) = self.flowers.get_mut(&id) {
                    flower.pos = pos;
                }
            }
            Tile::Player(id) => {
                if let Some(player) = self.players.get_mut(&id) {
                    player.pos = pos;
                }
            }
        }
    }

    fn delete_event(&mut self, foreground: bool, tile: Tile, pos: Pos) {
        match tile {
            Tile::Empty => {
                if foreground {
                    self.empty_foreground_count -= 1;
                }
            }
            Tile::Grass { .. } => self.grass_count -= 1,
            Tile::Block { .. } => {
                if !self.is_edge(pos) {
                    self.center_block_count -= 1;
                }
            }
            Tile::Flower(id) => {
                self.flowers.remove(&id);
            }
            Tile::Player(id) => {
                self.players.remove(&id);
            }
        }
    }

    /// Direct foreground placement, bypassing player actions. World
    /// generation and scenario setup; entity tiles should go through
    /// `add_player`/`spawn_flower` so their records exist.
    pub fn set_foreground(&mut self, pos: Pos, tile: Tile) {
        let index = self.index(pos);
        let last = self.foreground[index];
        let last_code = self.type_code(last);
        self.delete_event(true, last, pos);
        self.foreground[index] = tile;
        self.add_event(true, tile, pos);
        let code = self.type_code(tile);
        if code != last_code {
            self.push_change(true, pos, code);
        }
    }

    /// Direct background placement; see `set_foreground`.
    pub fn set_background(&mut self, pos: Pos, tile: Tile) {
        let index = self.index(pos);
        let last = self.background[index];
        let last_code = self.type_code(last);
        self.delete_event(false, last, pos);
        self.background[index] = tile;
        self.add_event(false, tile, pos);
        let code = self.type_code(tile);
        if code != last_code {
            self.push_change(false, pos, code);
        }
    }

    /// Updates an entity tile's recorded position after it moved cells.
    fn move_event(&mut self, tile: Tile, pos: Pos) {
        match tile {
            Tile::Flower(id) => {
                if let Some(flower) = self.flowers.get_mut(&id) {
                    flower.pos = pos;
                }
            }
            Tile::Player(id) => {
                if let Some(player) = self.players.get_mut(&id) {
                    player.pos = pos;
                }
            }
            _ => {}
        }
    }

    /// Swaps two foreground cells. Tiles move rather than being destroyed,
    /// so counters stay put; each side's change entry carries that side's
    /// own resulting type code.
    fn swap_foreground(&mut self, pos1: Pos, pos2: Pos) {
        let index1 = self.index(pos1);
        let index2 = self.index(pos2);
        let tile1 = self.foreground[index1];
        let tile2 = self.foreground[index2];
        let last_code1 = self.type_code(tile1);
        let last_code2 = self.type_code(tile2);
        self.foreground[index1] = tile2;
        self.foreground[index2] = tile1;
        self.move_event(tile2, pos1);
        self.move_event(tile1, pos2);
        let code1 = self.type_code(tile2);
        let code2 = self.type_code(tile1);
        if code1 != last_code1 {
            self.push_change(true, pos1, code1);
        }
        if code2 != last_code2 {
            self.push_change(true, pos2, code2);
        }
    }

    // ------------------------------------------------------------------
    // Players

    /// Adds a player, probing for a free cell near `init`: up to 400 random
    /// probes, accepting a removable tile after 200.
    pub fn add_player<R: Rng>(
        &mut self,
        name: impl Into<String>,
        level: u8,
        init: Pos,
        rng: &mut R,
    ) -> PlayerId {
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        self.players.insert(
            id,
            PlayerState {
                id,
                name: name.into(),
                pos: init,
                level,
                score: 0,
                flip: false,
            },
        );
        let mut pos = init;
        for count in 0..400 {
            let tile = self.foreground(pos);
            if tile.is_empty() || (count > 200 && tile.player_can_remove()) {
                break;
            }
            pos = Pos::new(rng.gen_range(0..self.size), rng.gen_range(0..self.size));
        }
        self.set_foreground(pos, Tile::Player(id));
        tracing::debug!(player = id.0, x = pos.x, y = pos.y, "player entered world");
        id
    }

    pub fn remove_player(&mut self, id: PlayerId) {
        if let Some(pos) = self.players.get(&id).map(|player| player.pos) {
            self.set_foreground(pos, Tile::Empty);
        }
    }

    /// Moves a player straight to an empty cell, ignoring adjacency.
    /// Admin/scenario tool; regular movement goes through `walk`.
    pub fn teleport_player(&mut self, id: PlayerId, pos: Pos) -> bool {
        let Some(from) = self.players.get(&id).map(|player| player.pos) else {
            return false;
        };
        if !self.in_bounds(pos) || !self.foreground(pos).is_empty() {
            return false;
        }
        self.swap_foreground(from, pos);
        true
    }

    fn set_flip(&mut self, id: PlayerId, offset: Pos) {
        if offset.x != 0 {
            if let Some(player) = self.players.get_mut(&id) {
                player.flip = offset.x < 0;
            }
        }
    }

    fn increase_score(&mut self, id: PlayerId, amount: u32) {
        if let Some(player) = self.players.get_mut(&id) {
            player.score += amount;
        }
    }

    /// Deducts up to `amount` from the player's score and returns how much
    /// was actually taken.
    fn decrease_score(&mut self, id: PlayerId, amount: u32) -> u32 {
        match self.players.get_mut(&id) {
            Some(player) => {
                let taken = amount.min(player.score);
                player.score -= taken;
                taken
            }
            None => 0,
        }
    }

    // ------------------------------------------------------------------
    // Player actions

    /// Moves the player one cell. Stepping onto a removable walkable tile
    /// (a mature flower) removes it first, so walking over a flower
    /// harvests it. Returns whether the step happened.
    pub fn walk(&mut self, id: PlayerId, offset: Pos) -> bool {
        let Some(pos) = self.players.get(&id).map(|player| player.pos) else {
            return false;
        };
        let next = pos.add(offset);
        if !self.in_bounds(next) {
            return false;
        }
        let tile = self.foreground(next);
        if !self.can_walk_on(tile) {
            return false;
        }
        if tile.player_can_remove() {
            self.remove_tile(id, offset);
        }
        self.swap_foreground(pos, next);
        self.set_flip(id, offset);
        true
    }

    /// Places a block on an adjacent empty cell.
    pub fn build_block(&mut self, id: PlayerId, offset: Pos, tier: u8) {
        let Some(pos) = self.players.get(&id).map(|player| player.pos) else {
            return;
        };
        let target = pos.add(offset);
        if !self.in_bounds(target) || !self.foreground(target).is_empty() {
            return;
        }
        self.set_foreground(target, Tile::Block { tier });
        self.set_flip(id, offset);
    }

    /// Places a flower entity directly on an empty cell. World generation
    /// and scenario setup; players plant through `build_sprout`.
    pub fn spawn_flower(
        &mut self,
        pos: Pos,
        creator: PlayerId,
        poisonous: bool,
        tier: u8,
        age: u32,
        growth_delay: u32,
    ) -> Option<FlowerId> {
        if !self.in_bounds(pos) || !self.foreground(pos).is_empty() {
            return None;
        }
        let flower_id = FlowerId(self.next_flower_id);
        self.next_flower_id += 1;
        self.flowers.insert(
            flower_id,
            Flower {
                pos,
                creator,
                poisonous,
                tier,
                age,
                growth_delay,
            },
        );
        self.set_foreground(pos, Tile::Flower(flower_id));
        Some(flower_id)
    }

    /// Plants a sprout on an adjacent empty cell. A `None` tier draws a
    /// random one: each successive tier is half as likely as the previous,
    /// capped by the planter's level.
    pub fn build_sprout<R: Rng>(
        &mut self,
        id: PlayerId,
        offset: Pos,
        poisonous: bool,
        tier: Option<u8>,
        rng: &mut R,
    ) {
        let Some((pos, level)) = self
            .players
            .get(&id)
            .map(|player| (player.pos, player.level))
        else {
            return;
        };
        let target = pos.add(offset);
        if !self.in_bounds(target) || !self.foreground(target).is_empty() {
            return;
        }
        let tier = tier.unwrap_or_else(|| random_tier(rng, level));
        let flower_id = FlowerId(self.next_flower_id);
        self.next_flower_id += 1;
        self.flowers.insert(
            flower_id,
            Flower {
                pos: target,
                creator: id,
                poisonous,
                tier,
                age: 0,
                growth_delay: 50 + rng.gen_range(0..50),
            },
        );
        self.set_foreground(target, Tile::Flower(flower_id));
        self.decrease_score(id, SPROUT_BUILD_COST);
        self.set_flip(id, offset);
    }

    /// Removes an adjacent removable tile, dispatching removal events.
    pub fn remove_tile(&mut self, id: PlayerId, offset: Pos) {
        let Some(pos) = self.players.get(&id).map(|player| player.pos) else {
            return;
        };
        let target = pos.add(offset);
        if !self.in_bounds(target) {
            return;
        }
        let tile = self.foreground(target);
        if !tile.player_can_remove() {
            return;
        }
        if let Tile::Flower(flower_id) = tile {
            let Some(flower) = self.flowers.get(&flower_id).cloned() else {
                return;
            };
            if flower.is_sprout() {
                self.decrease_score(id, SPROUT_REMOVAL_PENALTY);
            } else {
                self.events.push(WorldEvent::FlowerRemoved {
                    creator: flower.creator,
                    remover: id,
                    poisonous: flower.poisonous,
                });
                if flower.poisonous {
                    let taken = self.decrease_score(id, POISON_FLOWER_PENALTY);
                    if flower.creator != id {
                        self.increase_score(flower.creator, taken);
                    }
                    self.events.push(WorldEvent::Poisoned {
                        victim: id,
                        creator: flower.creator,
                    });
                    tracing::debug!(
                        victim = id.0,
                        creator = flower.creator.0,
                        "poisonous flower picked"
                    );
                } else {
                    self.increase_score(id, flower.tier as u32 + 1);
                }
            }
        }
        self.set_foreground(target, Tile::Empty);
        self.set_flip(id, offset);
    }

    /// Drains removal notifications accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Shared tick

    /// Advances the world clock one tick: flowers age (publishing stage
    /// changes and withering at end of life) and grass creeps over empty
    /// ground.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) {
        self.tick += 1;
        self.now += self.config.tick_seconds;

        let flower_ids: Vec<FlowerId> = self.flowers.keys().copied().collect();
        for flower_id in flower_ids {
            let Some(flower) = self.flowers.get_mut(&flower_id) else {
                continue;
            };
            let last_code = if flower.is_sprout() {
                SPROUT_CODE_BASE + flower.stage() as u16
            } else {
                FLOWER_CODE_BASE + flower.tier as u16
            };
            flower.age += 1;
            let withered = flower.age > flower.max_age();
            let pos = flower.pos;
            let code = if flower.is_sprout() {
                SPROUT_CODE_BASE + flower.stage() as u16
            } else {
                FLOWER_CODE_BASE + flower.tier as u16
            };
            if withered {
                self.set_foreground(pos, Tile::Empty);
            } else if code != last_code {
                self.push_change(true, pos, code);
            }
        }

        self.grow_grass(rng);
    }

    fn grow_grass<R: Rng>(&mut self, rng: &mut R) {
        if !rng.gen_bool(self.config.grass_growth_chance) {
            return;
        }
        let ratio = self.grass_count as f64 / self.empty_foreground_count.max(1) as f64;
        if ratio >= self.config.max_grass_ratio {
            return;
        }
        let pos = Pos::new(rng.gen_range(0..self.size), rng.gen_range(0..self.size));
        if self.foreground(pos).is_empty() && self.background(pos).is_empty() {
            let texture = rng.gen_range(0..GRASS_TEXTURE_COUNT);
            self.set_background(pos, Tile::Grass { texture });
        }
    }

    // ------------------------------------------------------------------
    // Persistence

    #[must_use]
    pub fn to_record(&self) -> petalgrid_data::WorldRecord {
        let tile_record = |tile: Tile| match tile {
            Tile::Empty | Tile::Player(_) => None,
            Tile::Grass { texture } => Some(petalgrid_data::TileRecord::Grass { texture }),
            Tile::Block { tier } => Some(petalgrid_data::TileRecord::Block { tier }),
            Tile::Flower(id) => {
                self.flowers
                    .get(&id)
                    .map(|flower| {
                        petalgrid_data::TileRecord::Flower(petalgrid_data::FlowerRecord {
                            creator: flower.creator,
                            poisonous: flower.poisonous,
                            tier: flower.tier,
                            age: flower.age,
                            growth_delay: flower.growth_delay,
                        })
                    })
            }
        };
        petalgrid_data::WorldRecord {
            foreground: self.foreground.iter().map(|&tile| tile_record(tile)).collect(),
            background: self.background.iter().map(|&tile| tile_record(tile)).collect(),
        }
    }

    /// Rebuilds a world from a stored record. Cells beyond the configured
    /// grid are ignored; missing cells stay empty.
    #[must_use]
    pub fn from_record(config: WorldConfig, record: &petalgrid_data::WorldRecord) -> Self {
        let mut world = Self::new(config);
        for (index, cell) in record.foreground.iter().enumerate() {
            if index >= world.tile_count() {
                break;
            }
            let pos = world.pos_of(index);
            match cell {
                None => {}
                Some(petalgrid_data::TileRecord::Grass { texture }) => {
                    world.set_foreground(pos, Tile::Grass { texture: *texture });
                }
                Some(petalgrid_data::TileRecord::Block { tier }) => {
                    world.set_foreground(pos, Tile::Block { tier: *tier });
                }
                Some(petalgrid_data::TileRecord::Flower(flower)) => {
                    world.spawn_flower(
                        pos,
                        flower.creator,
                        flower.poisonous,
                        flower.tier,
                        flower.age,
                        flower.growth_delay,
                    );
                    world.next_player_id = world.next_player_id.max(flower.creator.0 + 1);
                }
            }
        }
        for (index, cell) in record.background.iter().enumerate() {
            if index >= world.tile_count() {
                break;
            }
            if let Some(petalgrid_data::TileRecord::Grass { texture }) = cell {
                let pos = world.pos_of(index);
                world.set_background(pos, Tile::Grass { texture: *texture });
            }
        }
        world
    }
}

/// Random tier draw: geometric over successive bits of one random word,
/// capped by the catalog and the player's level.
fn random_tier<R: Rng>(rng: &mut R, level: u8) -> u8 {
    let bits: u32 = rng.gen();
    let mut tier = 0u8;
    while tier < TIER_COUNT - 1 && bits & (1 << tier) == 0 {
        tier += 1;
    }
    tier.min(level.saturating_sub(1))
}
