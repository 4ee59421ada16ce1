//! A materialized walking plan.
//!
//! Each step snapshots the tile occupying its cell at construction time;
//! the grid is shared and other entities mutate it between ticks, so the
//! path detects its own invalidation instead of relying on any locking.

use petalgrid_data::Pos;

use crate::tile::Tile;
use crate::world::World;

#[derive(Debug, Clone)]
pub struct PathStep {
    pub pos: Pos,
    tile: Tile,
}

impl PathStep {
    fn tile_has_changed(&self, world: &World) -> bool {
        world.foreground(self.pos) != self.tile
    }
}

/// An ordered sequence of cells from the agent's cell to a target. The
/// cursor points at the step currently being walked toward and only ever
/// moves forward; a replan replaces the path wholesale.
#[derive(Debug, Clone)]
pub struct WalkPath {
    steps: Vec<PathStep>,
    cursor: usize,
    /// Whether obstacles along the path may be broken instead of avoided.
    pub destructive: bool,
}

impl WalkPath {
    /// Builds a path over `cells` (root first, at least two cells),
    /// snapshotting the current tile of every cell.
    #[must_use]
    pub fn new(world: &World, cells: Vec<Pos>, destructive: bool) -> Self {
        let steps = cells
            .into_iter()
            .map(|pos| PathStep {
                pos,
                tile: world.foreground(pos),
            })
            .collect();
        Self {
            steps,
            cursor: 1,
            destructive,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step the agent is currently walking toward.
    #[must_use]
    pub fn next_step(&self) -> &PathStep {
        &self.steps[self.cursor]
    }

    pub fn steps(&self) -> impl Iterator<Item = &PathStep> {
        self.steps.iter()
    }

    /// Advances the cursor when the agent's post-move position matches the
    /// current step. Returns true when the path is complete.
    pub fn advance(&mut self, pos: Pos) -> bool {
        if pos == self.next_step().pos {
            if self.cursor >= self.steps.len() - 1 {
                return true;
            }
            self.cursor += 1;
        }
        false
    }

    /// Unit cardinal step from `pos` toward the next step, or `None` when
    /// already coincident.
    #[must_use]
    pub fn walk_offset(&self, pos: Pos) -> Option<Pos> {
        pos.step_toward(self.next_step().pos)
    }

    /// True when any tile at or beyond the cursor no longer matches its
    /// snapshot. The sole mid-walk reason to discard a path.
    #[must_use]
    pub fn is_stale(&self, world: &World) -> bool {
        self.steps[self.cursor..]
            .iter()
            .any(|step| step.tile_has_changed(world))
    }
}
