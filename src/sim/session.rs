//! Phase transitions outside the play tick: splash, pause, restart and
//! level advance. Each call is a no-op when the current phase does not
//! allow it, so callers can forward raw key presses without checking.

use super::event::GameEvent;
use super::level;
use super::world::{CampaignTotals, Phase, WorldState};

/// Fresh run: score and totals cleared, level 1 loaded, splash screen shown.
pub fn new_run(world: &mut WorldState) -> GameEvent {
    world.score = 0;
    world.last_clear_bonus = 0;
    world.totals = CampaignTotals::default();
    world.splash_timer = 0.0;
    world.phase = Phase::Splash;
    level::setup_level(world, 1)
}

/// Advance the splash countdown. Returns true when play begins.
pub fn tick_splash(world: &mut WorldState, dt: f32) -> bool {
    if world.phase != Phase::Splash {
        return false;
    }
    world.splash_timer += dt;
    if world.splash_timer >= world.rules.splash_seconds {
        world.phase = Phase::Playing;
        return true;
    }
    false
}

/// Skip the splash screen.
pub fn confirm(world: &mut WorldState) -> bool {
    if world.phase != Phase::Splash {
        return false;
    }
    world.phase = Phase::Playing;
    true
}

pub fn toggle_pause(world: &mut WorldState) -> bool {
    match world.phase {
        Phase::Playing => world.phase = Phase::Paused,
        Phase::Paused => world.phase = Phase::Playing,
        _ => return false,
    }
    log::debug!("pause toggled: {:?}", world.phase);
    true
}

/// Only from GameOver or LevelCleared. Starts over at level 1.
pub fn restart(world: &mut WorldState) -> Option<GameEvent> {
    if !matches!(world.phase, Phase::GameOver | Phase::LevelCleared) {
        return None;
    }
    log::info!("restart after level {} with score {}", world.level, world.score);
    Some(new_run(world))
}

/// Only from LevelCleared. Keeps score and totals.
pub fn next_level(world: &mut WorldState) -> Option<GameEvent> {
    if world.phase != Phase::LevelCleared {
        return None;
    }
    let ev = level::setup_level(world, world.level + 1);
    world.phase = Phase::Playing;
    Some(ev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;

    fn fresh() -> WorldState {
        let mut w = WorldState::new(RulesConfig::default(), 11);
        new_run(&mut w);
        w
    }

    #[test]
    fn splash_times_out() {
        let mut w = fresh();
        assert_eq!(w.phase, Phase::Splash);
        assert!(!tick_splash(&mut w, 9.0));
        assert!(tick_splash(&mut w, 1.5));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn confirm_skips_splash_only() {
        let mut w = fresh();
        assert!(confirm(&mut w));
        assert!(!confirm(&mut w));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn pause_round_trip() {
        let mut w = fresh();
        assert!(!toggle_pause(&mut w));
        confirm(&mut w);
        assert!(toggle_pause(&mut w));
        assert!(w.is_paused());
        assert!(toggle_pause(&mut w));
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn restart_and_next_level_need_an_ended_level() {
        let mut w = fresh();
        confirm(&mut w);
        assert!(restart(&mut w).is_none());
        assert!(next_level(&mut w).is_none());

        w.phase = Phase::GameOver;
        w.score = 900;
        assert!(next_level(&mut w).is_none());
        assert!(restart(&mut w).is_some());
        assert_eq!(w.phase, Phase::Splash);
        assert_eq!(w.score, 0);
        assert_eq!(w.level, 1);
    }

    #[test]
    fn next_level_keeps_score() {
        let mut w = fresh();
        w.phase = Phase::LevelCleared;
        w.score = 1234;
        w.totals.levels_cleared = 1;
        assert_eq!(next_level(&mut w), Some(GameEvent::LevelStarted { level: 2 }));
        assert_eq!(w.level, 2);
        assert_eq!(w.score, 1234);
        assert_eq!(w.totals.levels_cleared, 1);
        assert_eq!(w.phase, Phase::Playing);
    }
}
