//! Least-cost search over the world grid.
//!
//! One `scan` explores the whole reachable component from an origin under
//! a cost model chosen by the `destructive` flag, producing per-cell costs
//! with back-pointers for path reconstruction plus the pop order (cheapest
//! first) that downstream target selection iterates. The scan's
//! allocations are owned by its result and are meaningless once the grid
//! has moved on; callers re-scan rather than cache.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petalgrid_data::{Pos, CARDINAL_OFFSETS};

use crate::path::WalkPath;
use crate::tile::Tile;
use crate::world::World;

/// Traversal cost of entering a cell holding `tile`, or `None` when the
/// cell is impassable under this model. Blocks can be broken in
/// destructive mode at a premium; flowers and players are routed around
/// unless there is no cheaper way through.
#[must_use]
pub fn tile_cost(tile: Tile, destructive: bool) -> Option<u32> {
    match tile {
        Tile::Block { .. } => destructive.then_some(4),
        Tile::Flower(_) | Tile::Player(_) => Some(30),
        Tile::Empty | Tile::Grass { .. } => Some(1),
    }
}

/// Per-cell search state. A node with `cost: None` was discovered while
/// relaxing a neighbor but ruled impassable, which is distinct from a cell
/// the search never touched: that one has no node at all.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub cost: Option<u32>,
    pub previous: Option<usize>,
    pub visited: bool,
}

pub struct ScanResult {
    nodes: Vec<Option<SearchNode>>,
    /// Flat indices of visited cells in extraction order, so iteration
    /// sees cells cheapest-first.
    pub pop_order: Vec<usize>,
}

impl ScanResult {
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&SearchNode> {
        self.nodes.get(index).and_then(|node| node.as_ref())
    }

    /// Final path cost to the cell, when it was reached.
    #[must_use]
    pub fn cost_at(&self, world: &World, pos: Pos) -> Option<u32> {
        if !world.in_bounds(pos) {
            return None;
        }
        self.node(world.index(pos)).and_then(|node| node.cost)
    }

    /// The reached 4-neighbor of `pos` with the lowest path cost.
    #[must_use]
    pub fn closest_neighbor(&self, world: &World, pos: Pos) -> Option<usize> {
        let mut best: Option<(u32, usize)> = None;
        for offset in CARDINAL_OFFSETS {
            let neighbor = pos.add(offset);
            if !world.in_bounds(neighbor) {
                continue;
            }
            let index = world.index(neighbor);
            let Some(cost) = self.node(index).and_then(|node| node.cost) else {
                continue;
            };
            if best.is_none_or(|(best_cost, _)| cost < best_cost) {
                best = Some((cost, index));
            }
        }
        best.map(|(_, index)| index)
    }

    /// Materializes the back-pointer chain to `target` as a walkable path,
    /// root first. A chain of one cell means the agent is already there
    /// and yields no path.
    #[must_use]
    pub fn walk_path(&self, world: &World, target: usize, destructive: bool) -> Option<WalkPath> {
        self.node(target)?;
        let mut cells = Vec::new();
        let mut index = Some(target);
        while let Some(current) = index {
            cells.push(world.pos_of(current));
            index = self.node(current).and_then(|node| node.previous);
        }
        if cells.len() <= 1 {
            return None;
        }
        cells.reverse();
        Some(WalkPath::new(world, cells, destructive))
    }
}

/// Dijkstra over the 4-connected grid from `origin`. Runs until the queue
/// empties, so every cell reachable under the cost model ends up with its
/// true minimum cost; non-negative costs make the first extraction of a
/// cell final. Decreased priorities are handled by re-pushing and
/// skipping stale entries on pop.
#[must_use]
pub fn scan(world: &World, origin: Pos, destructive: bool) -> ScanResult {
    let mut nodes: Vec<Option<SearchNode>> = vec![None; world.tile_count()];
    let origin_index = world.index(origin);
    nodes[origin_index] = Some(SearchNode {
        cost: Some(0),
        previous: None,
        visited: false,
    });
    let mut queue: BinaryHeap<Reverse<(u32, usize)>> = BinaryHeap::new();
    queue.push(Reverse((0, origin_index)));
    let mut pop_order = Vec::new();

    while let Some(Reverse((cost, index))) = queue.pop() {
        {
            let Some(node) = nodes[index].as_mut() else {
                continue;
            };
            // Skip entries superseded by a cheaper re-push.
            if node.visited || node.cost != Some(cost) {
                continue;
            }
            node.visited = true;
        }
        pop_order.push(index);
        let pos = world.pos_of(index);
        for offset in CARDINAL_OFFSETS {
            let neighbor_pos = pos.add(offset);
            if !world.in_bounds(neighbor_pos) {
                continue;
            }
            let neighbor_index = world.index(neighbor_pos);
            let neighbor = nodes[neighbor_index].get_or_insert_with(|| SearchNode {
                cost: None,
                previous: None,
                visited: false,
            });
            if neighbor.visited {
                continue;
            }
            let Some(step_cost) = tile_cost(world.foreground(neighbor_pos), destructive) else {
                continue;
            };
            let next_cost = cost + step_cost;
            if neighbor.cost.is_none_or(|last| next_cost < last) {
                neighbor.previous = Some(index);
                neighbor.cost = Some(next_cost);
                queue.push(Reverse((next_cost, neighbor_index)));
            }
        }
    }

    ScanResult { nodes, pop_order }
}
