//! Falling-rock physics.
//!
//! A rock that lost support becomes a `FallingRock` entity and leaves the
//! terrain grid while airborne. It drops one tile per `fall_interval`:
//!
//! | cell below                         | result                      |
//! |------------------------------------|-----------------------------|
//! | on grid, empty, above floor guard  | move down one tile          |
//! | anything else                      | land: write Rock at own tile |
//!
//! The floor guard keeps rocks out of the bottom `floor_rows` rows.

use super::coord::{Coord, WORLD_HEIGHT};
use super::entity::{Body, GameThing};
use super::terrain::Terrain;
use super::tile::Block;

/// Result of one `FallingRock::update`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RockStep {
    Waiting,
    Fell,
    Landed,
}

/// Can a falling rock occupy `pos`?
pub fn can_fall_to(terrain: &Terrain, pos: Coord, floor_rows: i32) -> bool {
    pos.is_valid() && pos.y < WORLD_HEIGHT - floor_rows && terrain.is_empty(pos)
}

#[derive(Clone, Debug)]
pub struct FallingRock {
    body: Body,
    pub origin: Coord,
    landed: bool,
    fall_timer: f32,
    fall_interval: f32,
}

impl FallingRock {
    pub fn new(pos: Coord, fall_interval: f32) -> Self {
        FallingRock {
            body: Body::new(pos),
            origin: pos,
            landed: false,
            fall_timer: 0.0,
            fall_interval,
        }
    }

    pub fn update(&mut self, dt: f32, terrain: &mut Terrain, floor_rows: i32) -> RockStep {
        if self.landed {
            return RockStep::Waiting;
        }
        self.fall_timer += dt;
        if self.fall_timer < self.fall_interval {
            return RockStep::Waiting;
        }
        self.fall_timer = 0.0;

        let below = Coord::new(self.body.pos().x, self.body.pos().y + 1);
        if can_fall_to(terrain, below, floor_rows) && self.body.set_position(below) {
            return RockStep::Fell;
        }

        self.landed = true;
        terrain.set_block(self.body.pos(), Block::Rock);
        RockStep::Landed
    }

    pub fn is_landed(&self) -> bool {
        self.landed
    }

    /// Tiles dropped since leaving its origin.
    pub fn distance_fallen(&self) -> i32 {
        self.body.pos().y - self.origin.y
    }
}

impl GameThing for FallingRock {
    fn position(&self) -> Coord { self.body.pos() }
    fn is_active(&self) -> bool { self.body.active() && !self.landed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::terrain::terrain_from;
    use proptest::prelude::*;

    const FALL: f32 = 0.5;

    #[test]
    fn lands_on_occupied_cell_and_writes_rock() {
        let mut t = terrain_from(&[
            ".",
            "W",
        ]);
        let mut r = FallingRock::new(Coord::new(0, 0), FALL);
        assert_eq!(r.update(FALL, &mut t, 0), RockStep::Landed);
        assert!(r.is_landed());
        assert!(t.is_rock(Coord::new(0, 0)));
        assert_eq!(r.update(FALL, &mut t, 0), RockStep::Waiting);
    }

    #[test]
    fn waits_for_its_interval() {
        let mut t = terrain_from(&[".", ".", "W"]);
        let mut r = FallingRock::new(Coord::new(0, 0), FALL);
        assert_eq!(r.update(0.3, &mut t, 0), RockStep::Waiting);
        assert_eq!(r.update(0.3, &mut t, 0), RockStep::Fell);
        assert_eq!(r.position(), Coord::new(0, 1));
    }

    #[test]
    fn bottom_row_rock_lands_at_once() {
        let mut t = Terrain::solid();
        let p = Coord::new(7, WORLD_HEIGHT - 1);
        t.set_block(p, Block::Empty);
        let mut r = FallingRock::new(p, FALL);
        assert_eq!(r.update(1.0, &mut t, 0), RockStep::Landed);
        assert!(t.is_rock(p));
    }

    #[test]
    fn floor_guard_stops_rocks_above_bottom_rows() {
        let mut t = Terrain::solid();
        for y in 40..WORLD_HEIGHT {
            t.set_block(Coord::new(3, y), Block::Empty);
        }
        let mut r = FallingRock::new(Coord::new(3, 40), FALL);
        while r.update(FALL, &mut t, 5) != RockStep::Landed {}
        assert_eq!(r.position(), Coord::new(3, WORLD_HEIGHT - 6));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_descends_whole_shaft(depth in 1i32..30) {
            let mut t = Terrain::solid();
            for y in 0..=depth {
                t.set_block(Coord::new(10, y), Block::Empty);
            }
            let mut r = FallingRock::new(Coord::new(10, 0), FALL);
            let mut falls = 0;
            loop {
                match r.update(FALL, &mut t, 0) {
                    RockStep::Fell => falls += 1,
                    RockStep::Landed => break,
                    RockStep::Waiting => prop_assert!(false, "full interval must act"),
                }
            }
            prop_assert_eq!(falls, depth);
            prop_assert_eq!(r.position(), Coord::new(10, depth));
            prop_assert!(t.is_rock(Coord::new(10, depth)));
        }
    }
}
