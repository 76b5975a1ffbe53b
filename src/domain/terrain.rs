//! Terrain: the block grid of one level.
//!
//! ## Boundary rule
//!
//! Anything outside the grid reads as `Solid` for solidity queries and as
//! not-empty for emptiness queries, so callers never need bounds checks
//! before asking.
//!
//! ## Rock-fall triggers
//!
//! Terrain only *detects* unsupported rocks. Detection pushes the rock's
//! position into a trigger queue:
//!   - `dig_tunnel_at` checks the rock directly above the dug cell
//!   - `check_all_rocks_for_falling` scans the whole grid
//!
//! `take_triggered_rock_falls` drains the queue. Whoever drains it owns the
//! job of turning each position into a falling entity; a drained trigger
//! that is ignored is simply lost until the next scan finds it again.

use super::coord::{Coord, WORLD_HEIGHT, WORLD_WIDTH};
use super::tile::Block;

#[derive(Clone, Debug)]
pub struct Terrain {
    blocks: Vec<Block>,
    initial_rocks: Vec<Coord>,
    player_start: Coord,
    monster_starts: Vec<Coord>,
    triggered_falls: Vec<Coord>,
}

impl Terrain {
    /// Fully undug grid. Player start defaults to the origin until a layout sets it.
    pub fn solid() -> Self {
        Terrain {
            blocks: vec![Block::Solid; (WORLD_WIDTH * WORLD_HEIGHT) as usize],
            initial_rocks: vec![],
            player_start: Coord::new(0, 0),
            monster_starts: vec![],
            triggered_falls: vec![],
        }
    }

    // ── Queries ──

    #[inline]
    pub fn block_at(&self, pos: Coord) -> Block {
        match pos.index() {
            Some(i) => self.blocks[i],
            None => Block::Solid,
        }
    }

    #[inline]
    pub fn is_solid(&self, pos: Coord) -> bool {
        self.block_at(pos).is_solid()
    }

    /// Out of bounds is never empty.
    #[inline]
    pub fn is_empty(&self, pos: Coord) -> bool {
        pos.is_valid() && self.block_at(pos).is_empty()
    }

    #[inline]
    pub fn is_rock(&self, pos: Coord) -> bool {
        pos.is_valid() && self.block_at(pos).is_rock()
    }

    pub fn rock_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_rock()).count()
    }

    // ── Mutation ──

    /// Bounds-checked write. Returns false (and does nothing) out of bounds.
    pub fn set_block(&mut self, pos: Coord, block: Block) -> bool {
        match pos.index() {
            Some(i) => {
                self.blocks[i] = block;
                true
            }
            None => false,
        }
    }

    /// Turn `pos` into tunnel. Returns true if the block actually changed.
    /// A rock resting on the freshly dug cell is queued to fall.
    pub fn dig_tunnel_at(&mut self, pos: Coord) -> bool {
        let Some(i) = pos.index() else { return false };
        if self.blocks[i].is_empty() {
            return false;
        }
        self.blocks[i] = Block::Empty;
        self.check_rock_at(Coord::new(pos.x, pos.y - 1));
        true
    }

    /// Converts a rock cell to tunnel. Used when a rock leaves its origin to fall.
    pub fn remove_rock_at(&mut self, pos: Coord) -> bool {
        if !self.is_rock(pos) {
            return false;
        }
        self.set_block(pos, Block::Empty)
    }

    // ── Stability ──

    /// Queue `pos` if it holds a rock with a valid, empty cell below.
    /// Returns true if the position is (now) queued.
    pub fn check_rock_at(&mut self, pos: Coord) -> bool {
        if !self.is_rock(pos) {
            return false;
        }
        let below = Coord::new(pos.x, pos.y + 1);
        if !self.is_empty(below) {
            return false;
        }
        if !self.triggered_falls.contains(&pos) {
            self.triggered_falls.push(pos);
        }
        true
    }

    /// Full-grid stability scan. Bottom-up so the lowest rock of a stack
    /// is queued first.
    pub fn check_all_rocks_for_falling(&mut self) {
        for y in (0..WORLD_HEIGHT).rev() {
            for x in 0..WORLD_WIDTH {
                self.check_rock_at(Coord::new(x, y));
            }
        }
    }

    /// One-shot drain of the trigger queue.
    pub fn take_triggered_rock_falls(&mut self) -> Vec<Coord> {
        std::mem::take(&mut self.triggered_falls)
    }

    // ── Layout metadata ──

    pub fn player_start(&self) -> Coord {
        self.player_start
    }

    /// Sets the start and clears the tile under it.
    pub fn set_player_start(&mut self, pos: Coord) -> bool {
        if !pos.is_valid() {
            return false;
        }
        self.player_start = pos;
        self.set_block(pos, Block::Empty)
    }

    pub fn monster_starts(&self) -> &[Coord] {
        &self.monster_starts
    }

    pub fn add_monster_start(&mut self, pos: Coord) -> bool {
        if !pos.is_valid() {
            return false;
        }
        self.monster_starts.push(pos);
        self.set_block(pos, Block::Empty)
    }

    #[allow(dead_code)]
    pub fn initial_rocks(&self) -> &[Coord] {
        &self.initial_rocks
    }

    pub fn place_rock(&mut self, pos: Coord) -> bool {
        if !self.set_block(pos, Block::Rock) {
            return false;
        }
        self.initial_rocks.push(pos);
        true
    }
}

/// Test helper: build terrain from a diagram anchored at the origin.
/// Legend: 'W' solid, '.' empty, 'R' rock. Cells not covered stay solid.
#[cfg(test)]
pub fn terrain_from(rows: &[&str]) -> Terrain {
    let mut t = Terrain::solid();
    for (y, row) in rows.iter().enumerate() {
        for (x, ch) in row.chars().enumerate() {
            let pos = Coord::new(x as i32, y as i32);
            match ch {
                '.' => { t.set_block(pos, Block::Empty); }
                'R' => { t.place_rock(pos); }
                _ => {}
            }
        }
    }
    t
}
