//! Tethered harpoon.
//!
//! The harpoon never stores its own world position. Its tip is always
//!
//!   tip = anchor + direction × length
//!
//! where `anchor` is the player's position handed in on every `update`.
//! If the player walks while the line is out, the whole tether moves along.
//!
//! ```text
//!   Extending ──(length == range | tip off grid | mark_hit)──▶ Retracting
//!   Retracting ──(length == 0)──▶ Finished
//! ```
//!
//! Both phases advance one tile per `step_interval`.

use super::coord::{Coord, Direction};
use super::entity::GameThing;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HarpoonState {
    Extending,
    Retracting,
    Finished,
}

#[derive(Clone, Debug)]
pub struct Harpoon {
    anchor: Coord,
    pub direction: Direction,
    state: HarpoonState,
    length: u32,
    max_range: u32,
    move_timer: f32,
    step_interval: f32,
    hit: bool,
}

impl Harpoon {
    pub fn new(anchor: Coord, direction: Direction, max_range: u32, step_interval: f32) -> Self {
        Harpoon {
            anchor,
            direction,
            state: HarpoonState::Extending,
            length: 0,
            max_range,
            move_timer: 0.0,
            step_interval,
            hit: false,
        }
    }

    /// Re-anchor on the player, then advance at most one tile.
    pub fn update(&mut self, dt: f32, anchor: Coord) {
        self.anchor = anchor;
        if self.state == HarpoonState::Finished {
            return;
        }

        self.move_timer += dt;
        if self.move_timer < self.step_interval {
            return;
        }
        self.move_timer = 0.0;

        match self.state {
            HarpoonState::Extending => {
                if self.length < self.max_range {
                    self.length += 1;
                }
                if self.length >= self.max_range || !self.tip().is_valid() {
                    self.state = HarpoonState::Retracting;
                }
            }
            HarpoonState::Retracting => {
                self.length = self.length.saturating_sub(1);
                if self.length == 0 {
                    self.state = HarpoonState::Finished;
                }
            }
            HarpoonState::Finished => {}
        }
    }

    /// Collision notification. Locks the harpoon into retraction.
    pub fn mark_hit(&mut self) {
        if self.state == HarpoonState::Finished {
            return;
        }
        self.hit = true;
        self.state = HarpoonState::Retracting;
    }

    pub fn tip(&self) -> Coord {
        self.anchor + self.offset()
    }

    /// Tip relative to the anchor.
    pub fn offset(&self) -> Coord {
        let d = self.direction.delta();
        let n = self.length as i32;
        Coord::new(d.x * n, d.y * n)
    }

    /// Tiles covered by the line, anchor excluded, tip last.
    pub fn segments(&self) -> impl Iterator<Item = Coord> + '_ {
        let d = self.direction.delta();
        (1..=self.length as i32).map(move |i| self.anchor + Coord::new(d.x * i, d.y * i))
    }

    pub fn state(&self) -> HarpoonState { self.state }
    #[allow(dead_code)]
    pub fn length(&self) -> u32 { self.length }
    pub fn has_hit(&self) -> bool { self.hit }
    pub fn is_finished(&self) -> bool { self.state == HarpoonState::Finished }

    /// Can the tip still spear something this tick?
    pub fn can_hit(&self) -> bool {
        !self.hit && self.length > 0 && self.state != HarpoonState::Finished
    }
}

impl GameThing for Harpoon {
    fn position(&self) -> Coord { self.tip() }
    fn is_active(&self) -> bool { !self.is_finished() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coord::WORLD_WIDTH;
    use proptest::prelude::*;

    const STEP: f32 = 0.05;

    fn tick(h: &mut Harpoon, anchor: Coord) {
        h.update(STEP, anchor);
    }

    #[test]
    fn tip_follows_the_anchor() {
        let mut h = Harpoon::new(Coord::new(10, 10), Direction::Right, 8, STEP);
        tick(&mut h, Coord::new(10, 10));
        tick(&mut h, Coord::new(10, 10));
        assert_eq!(h.tip(), Coord::new(12, 10));
        // player steps down while the line is out
        h.update(0.0, Coord::new(10, 11));
        assert_eq!(h.tip(), Coord::new(12, 11));
        assert_eq!(h.segments().collect::<Vec<_>>(), vec![Coord::new(11, 11), Coord::new(12, 11)]);
    }

    #[test]
    fn sub_interval_updates_do_not_move() {
        let mut h = Harpoon::new(Coord::new(5, 5), Direction::Down, 8, STEP);
        h.update(0.02, Coord::new(5, 5));
        h.update(0.02, Coord::new(5, 5));
        assert_eq!(h.length(), 0);
        h.update(0.02, Coord::new(5, 5));
        assert_eq!(h.length(), 1);
    }

    #[test]
    fn edge_of_world_forces_retraction() {
        let anchor = Coord::new(WORLD_WIDTH - 2, 3);
        let mut h = Harpoon::new(anchor, Direction::Right, 8, STEP);
        tick(&mut h, anchor);
        assert_eq!(h.state(), HarpoonState::Extending);
        tick(&mut h, anchor);
        assert_eq!(h.state(), HarpoonState::Retracting);
        assert!(!h.tip().is_valid());
    }

    #[test]
    fn hit_locks_retraction() {
        let anchor = Coord::new(10, 10);
        let mut h = Harpoon::new(anchor, Direction::Left, 8, STEP);
        tick(&mut h, anchor);
        tick(&mut h, anchor);
        h.mark_hit();
        assert!(h.has_hit());
        assert!(!h.can_hit());
        assert_eq!(h.state(), HarpoonState::Retracting);
        tick(&mut h, anchor);
        tick(&mut h, anchor);
        assert!(h.is_finished());
        assert!(!h.is_active());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_extends_range_then_retracts_range(range in 1u32..20) {
            let anchor = Coord::new(30, 30);
            let mut h = Harpoon::new(anchor, Direction::Up, range, STEP);
            for i in 1..range {
                tick(&mut h, anchor);
                prop_assert_eq!(h.state(), HarpoonState::Extending);
                prop_assert_eq!(h.length(), i);
            }
            tick(&mut h, anchor);
            prop_assert_eq!(h.state(), HarpoonState::Retracting);
            prop_assert_eq!(h.length(), range);

            for _ in 1..range {
                tick(&mut h, anchor);
                prop_assert_eq!(h.state(), HarpoonState::Retracting);
            }
            tick(&mut h, anchor);
            prop_assert!(h.is_finished());
            prop_assert_eq!(h.tip(), anchor);
        }
    }
}
