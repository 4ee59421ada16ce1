//! Seed placement rules.
//!
//! Planting is legal on an empty cell with no flower crowding it, provided
//! the flower would not seal the last opening through a pinch point
//! between blocks. A flower is an obstacle until it matures, and a bot
//! that bricks up a corridor with its own sprout strands itself.

use petalgrid_data::{Pos, CLOCKWISE_OFFSETS};

use crate::tile::Tile;
use crate::world::World;

/// Whether every ring cell strictly between ring positions `from` and `to`
/// (walking clockwise, exclusive on both ends) is free of blocks.
/// Out-of-bounds cells do not block the arc.
fn arc_is_open(world: &World, center: Pos, from: usize, to: usize) -> bool {
    let mut index = from + 1;
    while index % 8 != to {
        let pos = center.add(CLOCKWISE_OFFSETS[index % 8]);
        if world.foreground_safe(pos).is_some_and(Tile::is_block) {
            return false;
        }
        index += 1;
    }
    true
}

/// Local geometric predicate for planting a seed at `pos`.
#[must_use]
pub fn can_plant_seed(world: &World, pos: Pos) -> bool {
    // Only plant in empty space.
    if !world.in_bounds(pos) || !world.foreground(pos).is_empty() {
        return false;
    }

    // Never adjacent to another flower: flowers crowd each other out.
    for offset_y in -1..=1 {
        for offset_x in -1..=1 {
            let neighbor = pos.add(Pos::new(offset_x, offset_y));
            if world.foreground_safe(neighbor).is_some_and(Tile::is_flower) {
                return false;
            }
        }
    }

    // Pinch rule: the open cardinal positions of the surrounding ring must
    // all remain mutually reachable around the ring. If some pair of
    // openings has both connecting arcs interrupted by blocks, this cell is
    // the only passage between them and planting here would seal it.
    let mut open_indexes = Vec::with_capacity(4);
    for index in (0..CLOCKWISE_OFFSETS.len()).step_by(2) {
        let ring_pos = pos.add(CLOCKWISE_OFFSETS[index]);
        if world
            .foreground_safe(ring_pos)
            .is_some_and(|tile| !tile.is_block())
        {
            open_indexes.push(index);
        }
    }
    for (slot, &first) in open_indexes.iter().enumerate() {
        for &second in &open_indexes[slot + 1..] {
            if !arc_is_open(world, pos, first, second) && !arc_is_open(world, pos, second, first) {
                return false;
            }
        }
    }
    true
}
