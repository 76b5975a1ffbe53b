//! Collision & resolution, run once per play tick in this order:
//!
//!   1. Player ↔ Monster     → loss (unless invulnerable); stop here
//!   2. Harpoon tip ↔ Monster → kill, harpoon retracts, maybe drop a power-up
//!   3. Player ↔ PowerUp     → apply effect, +50
//!   4. FallingRock ↔ Player → loss (unless invulnerable); stop here
//!      FallingRock ↔ Monster → crush every monster on the rock's tile
//!
//! All checks are tile equality. Entities are removed by index after the
//! scan that found them (collect, then remove in reverse).

use rand::Rng;

use crate::domain::coord::Coord;
use crate::domain::entity::{GameThing, PowerUp, PowerUpKind};
use crate::domain::rules;
use super::event::{DeathCause, GameEvent, KillCause};
use super::world::{Explosion, Phase, WorldState};

const KILL_SHAKE: (f32, f32) = (3.0, 0.3);
const DEATH_SHAKE: (f32, f32) = (5.0, 0.5);

/// Returns true if the player died (no further processing this tick).
pub fn resolve_collisions(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if player_meets_monster(world, events) {
        return true;
    }
    harpoons_hit_monsters(world, events);
    player_collects_power_ups(world, events);
    falling_rocks(world, events)
}

// ══════════════════════════════════════════════════════════════
// 1. Player ↔ Monster
// ══════════════════════════════════════════════════════════════

fn player_meets_monster(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.player.is_invulnerable() {
        return false;
    }
    let at = world.player.position();
    if !world.monsters.iter().any(|m| m.position() == at) {
        return false;
    }
    player_dies(world, DeathCause::Monster, events);
    true
}

// ══════════════════════════════════════════════════════════════
// 2. Harpoon ↔ Monster
// ══════════════════════════════════════════════════════════════

fn harpoons_hit_monsters(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for hi in 0..world.harpoons.len() {
        if !world.harpoons[hi].can_hit() {
            continue;
        }
        let tip = world.harpoons[hi].tip();
        let Some(mi) = world.monsters.iter().position(|m| m.position() == tip) else {
            continue;
        };

        let monster = world.monsters.remove(mi);
        world.harpoons[hi].mark_hit();
        let points = rules::harpoon_kill_points(monster.kind, world.level);
        events.push(GameEvent::HarpoonHit { at: tip });
        monster_dies(world, tip, monster.kind, KillCause::Harpoon, points, events);

        if world.rng.random_bool(world.rules.drop_chance) {
            let kind = PowerUpKind::ALL[world.rng.random_range(0..PowerUpKind::ALL.len())];
            let drop = PowerUp::dropped(tip, kind, world.rules.power_up_lifetime);
            spawn_power_up(world, drop, events);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// 3. Player ↔ PowerUp
// ══════════════════════════════════════════════════════════════

fn player_collects_power_ups(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let at = world.player.position();
    let hits: Vec<usize> = world.power_ups.iter()
        .enumerate()
        .filter(|(_, p)| p.is_active() && p.position() == at)
        .map(|(i, _)| i)
        .collect();

    for &i in hits.iter().rev() {
        let mut pu = world.power_ups.remove(i);
        pu.collect();
        world.player.apply_power_up(pu.kind, pu.duration());
        world.award(rules::POWER_UP_POINTS);
        log::debug!("collected {:?} at {:?}", pu.kind, at);
        events.push(GameEvent::PowerUpCollected { at, kind: pu.kind, points: rules::POWER_UP_POINTS });
        events.push(GameEvent::ScorePopup { at, points: rules::POWER_UP_POINTS });
    }
}

// ══════════════════════════════════════════════════════════════
// 4. FallingRock ↔ Player / Monster
// ══════════════════════════════════════════════════════════════

/// Rocks that landed this tick are still in the list and still count.
fn falling_rocks(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let player_at = world.player.position();
    if !world.player.is_invulnerable() && world.rocks.iter().any(|r| r.position() == player_at) {
        player_dies(world, DeathCause::Rock, events);
        return true;
    }

    let crushed: Vec<usize> = world.monsters.iter()
        .enumerate()
        .filter(|(_, m)| world.rocks.iter().any(|r| r.position() == m.position()))
        .map(|(i, _)| i)
        .collect();

    for &i in crushed.iter().rev() {
        let monster = world.monsters.remove(i);
        let at = monster.position();
        let points = rules::rock_crush_points(world.level);
        monster_dies(world, at, monster.kind, KillCause::Rock, points, events);
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Shared outcomes
// ══════════════════════════════════════════════════════════════

fn monster_dies(
    world: &mut WorldState,
    at: Coord,
    kind: crate::domain::ai::MonsterKind,
    cause: KillCause,
    points: u32,
    events: &mut Vec<GameEvent>,
) {
    world.award(points);
    world.level_kills += 1;
    world.totals.monsters_killed += 1;
    world.explosions.push(Explosion::new(at));
    log::debug!("{kind:?} killed by {cause:?} at {at:?} for {points}");

    events.push(GameEvent::MonsterKilled { at, kind, cause, points });
    events.push(GameEvent::Explosion { at, magnitude: KILL_SHAKE.0 });
    events.push(GameEvent::ScorePopup { at, points });
    events.push(GameEvent::ScreenShake { intensity: KILL_SHAKE.0, duration: KILL_SHAKE.1 });
}

fn player_dies(world: &mut WorldState, cause: DeathCause, events: &mut Vec<GameEvent>) {
    let at = world.player.position();
    world.player.kill();
    world.phase = Phase::GameOver;
    world.explosions.push(Explosion::new(at));
    log::info!(
        "player killed by {cause:?} on level {} (score {})",
        world.level, world.score,
    );
    events.push(GameEvent::PlayerKilled { at, cause });
    events.push(GameEvent::Explosion { at, magnitude: DEATH_SHAKE.0 });
    events.push(GameEvent::ScreenShake { intensity: DEATH_SHAKE.0, duration: DEATH_SHAKE.1 });
}

pub fn spawn_power_up(world: &mut WorldState, power_up: PowerUp, events: &mut Vec<GameEvent>) {
    let (at, kind) = (power_up.position(), power_up.kind);
    log::debug!("power-up {kind:?} at {at:?} (drop: {})", power_up.from_drop);
    world.power_ups.push(power_up);
    events.push(GameEvent::PowerUpSpawned { at, kind });
}
