//! Monster AI: a three-state machine evaluated on a decision cadence.
//!
//! | from        | condition                                  | to          |
//! |-------------|--------------------------------------------|-------------|
//! | Patrolling  | dist ≤ detection                           | Chasing     |
//! | Chasing     | dist ≤ 5.0                                 | Aggressive  |
//! | Chasing     | dist > detection × 1.5                     | Patrolling  |
//! | Aggressive  | aggression timer expired and dist > 8.0    | Chasing     |
//!
//! Detection is 8 tiles for red monsters and 12 for dragons.
//!
//! Movement happens only on decision ticks. A monster steps one tile along
//! the axis with the larger gap to its target; ties go vertical. Patrolling
//! monsters wander in a random direction 25% of the time instead.
//! Monsters ignore terrain entirely and only refuse off-grid moves.
//!
//! Dragons can breathe fire while Aggressive with the target within 6
//! tiles, once every 3 seconds.

use rand::Rng;

use super::coord::{Coord, Direction};
use super::entity::{Body, GameThing};

pub const AGGRESSIVE_RANGE: f32 = 5.0;
pub const CALM_RANGE: f32 = 8.0;
pub const AGGRESSION_SECONDS: f32 = 5.0;
pub const BREATH_RANGE: f32 = 6.0;
pub const BREATH_COOLDOWN: f32 = 3.0;
pub const PATROL_JITTER: f64 = 0.25;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MonsterKind {
    RedMonster,
    GreenDragon,
}

impl MonsterKind {
    pub fn detection_range(self) -> f32 {
        match self {
            MonsterKind::RedMonster => 8.0,
            MonsterKind::GreenDragon => 12.0,
        }
    }

    /// Kill value before level scaling.
    pub fn base_points(self) -> u32 {
        match self {
            MonsterKind::RedMonster => 100,
            MonsterKind::GreenDragon => 200,
        }
    }

    /// Every third monster of a level (0, 3, 6, ...) is a dragon.
    pub fn for_index(index: usize) -> Self {
        if index % 3 == 0 {
            MonsterKind::GreenDragon
        } else {
            MonsterKind::RedMonster
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MonsterState {
    Patrolling,
    Chasing,
    Aggressive,
}

/// What happened during one `Monster::update`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MonsterStep {
    pub moved: bool,
    pub breathed: bool,
}

#[derive(Clone, Debug)]
pub struct Monster {
    body: Body,
    pub kind: MonsterKind,
    state: MonsterState,
    target: Coord,
    decision_timer: f32,
    decision_interval: f32,
    aggression_timer: f32,
    breath_cooldown: f32,
}

impl Monster {
    pub fn new(pos: Coord, kind: MonsterKind, decision_interval: f32) -> Self {
        Monster {
            body: Body::new(pos),
            kind,
            state: MonsterState::Patrolling,
            target: pos,
            decision_timer: 0.0,
            decision_interval,
            aggression_timer: AGGRESSION_SECONDS,
            breath_cooldown: 0.0,
        }
    }

    pub fn set_target(&mut self, target: Coord) {
        self.target = target;
    }

    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> MonsterStep {
        let mut out = MonsterStep::default();
        if !self.body.active() {
            return out;
        }

        self.breath_cooldown = (self.breath_cooldown - dt).max(0.0);
        self.decision_timer += dt;
        if self.decision_timer < self.decision_interval {
            return out;
        }
        self.decision_timer = 0.0;

        let dist = self.body.pos().distance_to(self.target);
        self.update_behavior(dist);

        if let Some(dir) = self.choose_direction(rng) {
            out.moved = self.body.set_position(self.body.pos().step(dir));
        }

        if self.can_fire_breath() {
            self.breath_cooldown = BREATH_COOLDOWN;
            out.breathed = true;
        }
        out
    }

    fn update_behavior(&mut self, dist: f32) {
        if self.state == MonsterState::Aggressive {
            self.aggression_timer = (self.aggression_timer - self.decision_interval).max(0.0);
        }
        let next = next_state(self.state, dist, self.kind.detection_range(), self.aggression_timer);
        if next == MonsterState::Aggressive && self.state != MonsterState::Aggressive {
            self.aggression_timer = AGGRESSION_SECONDS;
        }
        self.state = next;
    }

    fn choose_direction<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Direction> {
        if self.state == MonsterState::Patrolling && rng.random_bool(PATROL_JITTER) {
            return Some(Direction::ALL[rng.random_range(0..Direction::ALL.len())]);
        }
        step_toward(self.body.pos(), self.target)
    }

    /// Dragon only: Aggressive, target within breath range, cooldown elapsed.
    pub fn can_fire_breath(&self) -> bool {
        self.kind == MonsterKind::GreenDragon
            && self.state == MonsterState::Aggressive
            && self.breath_cooldown <= 0.0
            && self.body.pos().distance_to(self.target) <= BREATH_RANGE
    }

    pub fn state(&self) -> MonsterState { self.state }
    #[allow(dead_code)]
    pub fn breath_cooldown(&self) -> f32 { self.breath_cooldown }
    #[allow(dead_code)]
    pub fn decision_interval(&self) -> f32 { self.decision_interval }
}

impl GameThing for Monster {
    fn position(&self) -> Coord { self.body.pos() }
    fn is_active(&self) -> bool { self.body.active() }
}

/// The transition table from the module docs.
pub fn next_state(state: MonsterState, dist: f32, detection: f32, aggression_left: f32) -> MonsterState {
    match state {
        MonsterState::Patrolling if dist <= detection => MonsterState::Chasing,
        MonsterState::Chasing if dist <= AGGRESSIVE_RANGE => MonsterState::Aggressive,
        MonsterState::Chasing if dist > detection * 1.5 => MonsterState::Patrolling,
        MonsterState::Aggressive if aggression_left <= 0.0 && dist > CALM_RANGE => MonsterState::Chasing,
        s => s,
    }
}

/// Greedy one-tile step: larger axis first, vertical on ties.
pub fn step_toward(from: Coord, to: Coord) -> Option<Direction> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx.abs() > dy.abs() {
        Some(if dx > 0 { Direction::Right } else { Direction::Left })
    } else {
        Some(if dy > 0 { Direction::Down } else { Direction::Up })
    }
}
