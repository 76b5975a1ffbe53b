//! Events emitted during a simulation step.
//! The presentation layer consumes these for effects and sound; the
//! simulation never calls into audio or drawing code itself.

use crate::domain::ai::MonsterKind;
use crate::domain::coord::{Coord, Direction};
use crate::domain::entity::PowerUpKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum KillCause {
    Harpoon,
    Rock,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    Monster,
    Rock,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    LevelStarted { level: u32 },
    Dug { at: Coord },
    HarpoonFired { from: Coord, direction: Direction },
    HarpoonHit { at: Coord },
    MonsterKilled { at: Coord, kind: MonsterKind, cause: KillCause, points: u32 },
    DragonBreath { from: Coord, toward: Coord },
    Explosion { at: Coord, magnitude: f32 },
    ScorePopup { at: Coord, points: u32 },
    ScreenShake { intensity: f32, duration: f32 },
    RockLoosened { at: Coord },
    RockLanded { at: Coord },
    PowerUpSpawned { at: Coord, kind: PowerUpKind },
    PowerUpCollected { at: Coord, kind: PowerUpKind, points: u32 },
    PowerUpExpired { at: Coord },
    PlayerKilled { at: Coord, cause: DeathCause },
    LevelCleared { level: u32, bonus: u32 },
}
