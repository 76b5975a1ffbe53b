//! Entities: the shared `GameThing` contract, Player and PowerUp.
//! Monster lives in `ai`, Harpoon in `harpoon`, FallingRock in `physics`.
//!
//! Every entity owns a tile position and an active flag. Position writes go
//! through `Body::set_position`, which rejects anything off the grid, so no
//! entity can ever sit outside the world.

use crate::config::RulesConfig;

use super::coord::{Coord, Direction, PixelRect};
use super::terrain::Terrain;

/// Read access shared by every simulated entity.
pub trait GameThing {
    fn position(&self) -> Coord;
    fn is_active(&self) -> bool;

    #[allow(dead_code)]
    fn bounds(&self) -> PixelRect {
        self.position().bounds()
    }
}

/// Position + active flag, embedded in each entity.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Body {
    pos: Coord,
    active: bool,
}

impl Body {
    pub fn new(pos: Coord) -> Self {
        Body { pos, active: true }
    }

    pub fn pos(&self) -> Coord {
        self.pos
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Rejected (returns false) when `pos` is off the grid.
    pub fn set_position(&mut self, pos: Coord) -> bool {
        if !pos.is_valid() {
            return false;
        }
        self.pos = pos;
        true
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

// ══════════════════════════════════════════════════════════════
// Power-ups
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerUpKind {
    SpeedBoost,
    ExtendedRange,
    RapidFire,
    Invulnerability,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::SpeedBoost,
        PowerUpKind::ExtendedRange,
        PowerUpKind::RapidFire,
        PowerUpKind::Invulnerability,
    ];

    /// Effect duration in seconds once collected.
    pub fn duration(self) -> f32 {
        match self {
            PowerUpKind::SpeedBoost => 10.0,
            PowerUpKind::ExtendedRange => 15.0,
            PowerUpKind::RapidFire => 8.0,
            PowerUpKind::Invulnerability => 5.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::SpeedBoost => "SPEED",
            PowerUpKind::ExtendedRange => "RANGE",
            PowerUpKind::RapidFire => "RAPID",
            PowerUpKind::Invulnerability => "SHIELD",
        }
    }

    fn slot(self) -> usize {
        match self {
            PowerUpKind::SpeedBoost => 0,
            PowerUpKind::ExtendedRange => 1,
            PowerUpKind::RapidFire => 2,
            PowerUpKind::Invulnerability => 3,
        }
    }
}

/// A pickup lying in a tunnel.
#[derive(Clone, Debug)]
pub struct PowerUp {
    body: Body,
    pub kind: PowerUpKind,
    pub collected: bool,
    /// Seconds since spawn, drives the renderer's pulse.
    pub pulse_timer: f32,
    /// Seconds left on the field before it vanishes.
    pub lifetime: f32,
    /// Left behind by a speared monster rather than the field timer.
    pub from_drop: bool,
}

impl PowerUp {
    pub fn new(pos: Coord, kind: PowerUpKind, lifetime: f32) -> Self {
        PowerUp { body: Body::new(pos), kind, collected: false, pulse_timer: 0.0, lifetime, from_drop: false }
    }

    pub fn dropped(pos: Coord, kind: PowerUpKind, lifetime: f32) -> Self {
        PowerUp { from_drop: true, ..PowerUp::new(pos, kind, lifetime) }
    }

    /// Returns true the tick it expires uncollected.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.body.active() {
            return false;
        }
        self.pulse_timer += dt;
        self.lifetime = (self.lifetime - dt).max(0.0);
        if self.lifetime <= 0.0 {
            self.body.deactivate();
            return true;
        }
        false
    }

    pub fn collect(&mut self) {
        self.collected = true;
        self.body.deactivate();
    }

    pub fn duration(&self) -> f32 {
        self.kind.duration()
    }
}

impl GameThing for PowerUp {
    fn position(&self) -> Coord { self.body.pos() }
    fn is_active(&self) -> bool { self.body.active() && !self.collected }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

/// What happened during one `Player::update`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PlayerStep {
    pub moved: bool,
    /// Tile dug out by this move, if any.
    pub dug: Option<Coord>,
}

#[derive(Clone, Debug)]
pub struct Player {
    body: Body,
    pub facing: Direction,
    move_timer: f32,
    shoot_cooldown: f32,
    /// Remaining seconds per `PowerUpKind`, indexed by `slot()`.
    power_timers: [f32; 4],
    base_range: u32,
    move_interval: f32,
    boosted_move_interval: f32,
    base_cooldown: f32,
    rapid_cooldown: f32,
}

impl Player {
    pub fn new(pos: Coord, rules: &RulesConfig) -> Self {
        Player {
            body: Body::new(pos),
            facing: Direction::Right,
            move_timer: 0.0,
            shoot_cooldown: 0.0,
            power_timers: [0.0; 4],
            base_range: rules.harpoon_range,
            move_interval: rules.move_interval,
            boosted_move_interval: rules.boosted_move_interval,
            base_cooldown: rules.shoot_cooldown,
            rapid_cooldown: rules.rapid_fire_cooldown,
        }
    }

    /// Advance timers, then try one move in `intent`.
    ///
    /// Walking into earth digs it. Rocks block. Off-grid moves are ignored.
    /// Movement is throttled by the move interval, so holding a direction
    /// moves at a steady pace regardless of frame rate.
    pub fn update(&mut self, dt: f32, intent: Option<Direction>, terrain: &mut Terrain) -> PlayerStep {
        let mut out = PlayerStep::default();
        if !self.body.active() {
            return out;
        }

        self.shoot_cooldown = (self.shoot_cooldown - dt).max(0.0);
        self.move_timer = (self.move_timer - dt).max(0.0);
        for t in self.power_timers.iter_mut() {
            *t = (*t - dt).max(0.0);
        }

        let Some(dir) = intent else { return out };
        if self.move_timer > 0.0 {
            return out;
        }
        self.facing = dir;

        let dest = self.body.pos().step(dir);
        if !dest.is_valid() || terrain.is_rock(dest) {
            return out;
        }
        if terrain.block_at(dest).is_diggable() && terrain.dig_tunnel_at(dest) {
            out.dug = Some(dest);
        }
        out.moved = self.body.set_position(dest);
        self.move_timer = self.current_move_interval();
        out
    }

    pub fn set_position(&mut self, pos: Coord) -> bool {
        self.body.set_position(pos)
    }

    pub fn kill(&mut self) {
        self.body.deactivate();
    }

    // ── Weapon ──

    pub fn can_fire(&self) -> bool {
        self.body.active() && self.shoot_cooldown <= 0.0
    }

    /// Starts the reload. Returns false if still reloading.
    pub fn fire_weapon(&mut self) -> bool {
        if !self.can_fire() {
            return false;
        }
        self.shoot_cooldown = if self.has_power_up(PowerUpKind::RapidFire) {
            self.rapid_cooldown
        } else {
            self.base_cooldown
        };
        true
    }

    pub fn shoot_cooldown(&self) -> f32 {
        self.shoot_cooldown
    }

    /// Doubled while EXTENDED_RANGE is active.
    pub fn harpoon_range(&self) -> u32 {
        if self.has_power_up(PowerUpKind::ExtendedRange) {
            self.base_range * 2
        } else {
            self.base_range
        }
    }

    // ── Power-ups ──

    /// Re-collecting a kind restarts its timer; durations do not stack.
    pub fn apply_power_up(&mut self, kind: PowerUpKind, duration: f32) {
        self.power_timers[kind.slot()] = duration.max(0.0);
    }

    pub fn has_power_up(&self, kind: PowerUpKind) -> bool {
        self.power_timers[kind.slot()] > 0.0
    }

    pub fn power_up_remaining(&self, kind: PowerUpKind) -> f32 {
        self.power_timers[kind.slot()]
    }

    pub fn is_invulnerable(&self) -> bool {
        self.has_power_up(PowerUpKind::Invulnerability)
    }

    fn current_move_interval(&self) -> f32 {
        if self.has_power_up(PowerUpKind::SpeedBoost) {
            self.boosted_move_interval
        } else {
            self.move_interval
        }
    }
}

impl GameThing for Player {
    fn position(&self) -> Coord { self.body.pos() }
    fn is_active(&self) -> bool { self.body.active() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::terrain::terrain_from;

    fn player_at(x: i32, y: i32) -> Player {
        Player::new(Coord::new(x, y), &RulesConfig::default())
    }

    #[test]
    fn starts_facing_right_and_ready_to_fire() {
        let p = player_at(3, 3);
        assert_eq!(p.facing, Direction::Right);
        assert!(p.can_fire());
        assert_eq!(p.harpoon_range(), 8);
    }

    #[test]
    fn bounds_are_one_block_at_pixel_position() {
        let p = player_at(3, 4);
        let r = p.bounds();
        assert_eq!((r.x, r.y), (30, 40));
        assert_eq!((r.w, r.h), (10, 10));
    }

    #[test]
    fn walking_into_earth_digs_it() {
        let mut t = terrain_from(&[
            "WWW",
            "W.W",
        ]);
        let mut p = player_at(1, 1);
        let step = p.update(0.016, Some(Direction::Up), &mut t);
        assert!(step.moved);
        assert_eq!(step.dug, Some(Coord::new(1, 0)));
        assert!(t.is_empty(Coord::new(1, 0)));
        assert_eq!(p.position(), Coord::new(1, 0));
        assert_eq!(p.facing, Direction::Up);
    }

    #[test]
    fn rocks_block_but_turn_the_player() {
        let mut t = terrain_from(&[".R"]);
        let mut p = player_at(0, 0);
        let step = p.update(0.016, Some(Direction::Right), &mut t);
        assert!(!step.moved);
        assert_eq!(p.position(), Coord::new(0, 0));
        assert!(t.is_rock(Coord::new(1, 0)));
        assert_eq!(p.facing, Direction::Right);
    }

    #[test]
    fn off_grid_move_is_ignored() {
        let mut t = terrain_from(&["."]);
        let mut p = player_at(0, 0);
        assert!(!p.update(0.016, Some(Direction::Left), &mut t).moved);
        assert_eq!(p.position(), Coord::new(0, 0));
    }

    #[test]
    fn move_interval_throttles_held_direction() {
        let mut t = terrain_from(&["......"]);
        let mut p = player_at(0, 0);
        assert!(p.update(0.016, Some(Direction::Right), &mut t).moved);
        assert!(!p.update(0.05, Some(Direction::Right), &mut t).moved);
        assert!(p.update(0.08, Some(Direction::Right), &mut t).moved);
        assert_eq!(p.position(), Coord::new(2, 0));
    }

    #[test]
    fn speed_boost_halves_move_interval() {
        let mut t = terrain_from(&["......"]);
        let mut p = player_at(0, 0);
        p.apply_power_up(PowerUpKind::SpeedBoost, 10.0);
        assert!(p.update(0.016, Some(Direction::Right), &mut t).moved);
        assert!(p.update(0.07, Some(Direction::Right), &mut t).moved);
    }

    #[test]
    fn fire_sets_cooldown_and_rapid_fire_shortens_it() {
        let mut p = player_at(0, 0);
        assert!(p.fire_weapon());
        assert!(!p.can_fire());
        assert!((p.shoot_cooldown() - 1.0).abs() < 1e-6);

        let mut q = player_at(0, 0);
        q.apply_power_up(PowerUpKind::RapidFire, 8.0);
        q.fire_weapon();
        assert!((q.shoot_cooldown() - 0.35).abs() < 1e-6);
    }

    #[test]
    fn extended_range_exactly_doubles() {
        let mut p = player_at(0, 0);
        p.apply_power_up(PowerUpKind::ExtendedRange, PowerUpKind::ExtendedRange.duration());
        assert_eq!(p.harpoon_range(), 16);
    }

    #[test]
    fn invulnerability_lasts_its_duration() {
        let mut t = terrain_from(&["."]);
        let mut p = player_at(0, 0);
        p.apply_power_up(PowerUpKind::Invulnerability, 5.0);
        assert!(p.is_invulnerable());
        p.update(4.9, None, &mut t);
        assert!(p.is_invulnerable());
        p.update(0.2, None, &mut t);
        assert!(!p.is_invulnerable());
    }

    #[test]
    fn power_up_durations_match_kind() {
        assert_eq!(PowerUpKind::SpeedBoost.duration(), 10.0);
        assert_eq!(PowerUpKind::ExtendedRange.duration(), 15.0);
        assert_eq!(PowerUpKind::RapidFire.duration(), 8.0);
        assert_eq!(PowerUpKind::Invulnerability.duration(), 5.0);
    }

    #[test]
    fn uncollected_power_up_expires() {
        let mut pu = PowerUp::new(Coord::new(2, 2), PowerUpKind::RapidFire, 1.0);
        assert!(!pu.update(0.5));
        assert!(pu.pulse_timer > 0.0);
        assert!(pu.update(0.6));
        assert!(!pu.is_active());
    }

    #[test]
    fn body_rejects_invalid_positions() {
        let mut p = player_at(4, 4);
        assert!(!p.set_position(Coord::new(-1, 4)));
        assert_eq!(p.position(), Coord::new(4, 4));
    }
}
