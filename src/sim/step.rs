/// The step function: advances the world by one frame.
///
/// Phase routing happens first (pause toggle, splash, restart, next level).
/// A Playing tick then runs, in order:
///   1. Player movement and digging
///   2. Monster AI (targets re-pointed at the player first)
///   3. Harpoons
///   4. Explosion timers
///   5. Power-up pulse / expiry
///   6. Falling rocks
///   7. Fire request
///   8. Timed power-up spawn
///   9. Rock triggers (queue drained every tick, full scan on a slower cadence)
///  10. Collisions (see collision.rs)
///  11. Win check
///
/// Entities advance with `dt` in seconds; everything is deterministic for a
/// given seed and input sequence.

use rand::Rng;

use crate::domain::coord::{Coord, Direction, WORLD_HEIGHT, WORLD_WIDTH};
use crate::domain::entity::{GameThing, PowerUp, PowerUpKind};
use crate::domain::harpoon::Harpoon;
use crate::domain::physics::{self, FallingRock, RockStep};
use crate::domain::rules;
use super::collision;
use super::event::GameEvent;
use super::session;
use super::world::{Phase, WorldState};

/// Timed spawns stay this far from every edge.
const SPAWN_MARGIN: i32 = 15;
const SPAWN_ATTEMPTS: usize = 20;

/// One frame of player intent. Flags are edge-triggered (one press, one action).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub movement: Option<Direction>,
    pub fire: bool,
    pub pause: bool,
    pub confirm: bool,
    pub restart: bool,
    pub next_level: bool,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt: f32) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    if input.pause {
        session::toggle_pause(world);
    }

    match world.phase {
        Phase::Splash => {
            if input.confirm {
                session::confirm(world);
            } else {
                session::tick_splash(world, dt);
            }
        }
        Phase::Paused => {}
        Phase::Playing => play_tick(world, input, dt, &mut events),
        Phase::GameOver | Phase::LevelCleared => {
            if input.restart {
                events.extend(session::restart(world));
            } else if input.next_level {
                events.extend(session::next_level(world));
            }
        }
    }
    events
}

fn play_tick(world: &mut WorldState, input: FrameInput, dt: f32, events: &mut Vec<GameEvent>) {
    world.tick += 1;
    world.level_time += dt;
    world.totals.play_time += dt;

    resolve_player(world, input.movement, dt, events);
    resolve_monsters(world, dt, events);
    resolve_harpoons(world, dt);
    resolve_explosions(world, dt);
    resolve_power_ups(world, dt, events);
    let landed = resolve_falling_rocks(world, dt, events);
    if input.fire {
        resolve_fire(world, events);
    }
    resolve_power_up_spawn(world, dt, events);
    resolve_rock_triggers(world, dt, landed, events);

    if collision::resolve_collisions(world, events) {
        return;
    }
    world.rocks.retain(|r| !r.is_landed());
    resolve_win(world, events);
}

// ══════════════════════════════════════════════════════════════
// Entities
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut WorldState, intent: Option<Direction>, dt: f32, events: &mut Vec<GameEvent>) {
    let step = world.player.update(dt, intent, &mut world.terrain);
    if let Some(at) = step.dug {
        events.push(GameEvent::Dug { at });
    }
}

fn resolve_monsters(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let target = world.player.position();
    for m in world.monsters.iter_mut() {
        m.set_target(target);
        let step = m.update(dt, &mut world.rng);
        if step.breathed {
            events.push(GameEvent::DragonBreath { from: m.position(), toward: target });
        }
    }
}

/// Harpoons stay tethered to the player; finished ones are dropped.
fn resolve_harpoons(world: &mut WorldState, dt: f32) {
    let anchor = world.player.position();
    for h in world.harpoons.iter_mut() {
        h.update(dt, anchor);
    }
    world.harpoons.retain(|h| !h.is_finished());
}

fn resolve_explosions(world: &mut WorldState, dt: f32) {
    for e in world.explosions.iter_mut() {
        e.timer -= dt;
    }
    world.explosions.retain(|e| e.timer > 0.0);
}

fn resolve_power_ups(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    for p in world.power_ups.iter_mut() {
        if p.update(dt) {
            events.push(GameEvent::PowerUpExpired { at: p.position() });
        }
    }
    world.power_ups.retain(|p| p.is_active());
}

/// Returns true if any rock landed this tick.
fn resolve_falling_rocks(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) -> bool {
    let floor_rows = world.rules.floor_rows;
    let mut landed = false;
    for r in world.rocks.iter_mut() {
        if r.update(dt, &mut world.terrain, floor_rows) == RockStep::Landed {
            log::debug!("rock landed at {:?} after {} tiles", r.position(), r.distance_fallen());
            events.push(GameEvent::RockLanded { at: r.position() });
            landed = true;
        }
    }
    landed
}

fn resolve_fire(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.fire_weapon() {
        return;
    }
    let from = world.player.position();
    let direction = world.player.facing;
    world.harpoons.push(Harpoon::new(from, direction, world.player.harpoon_range(), world.rules.harpoon_step));
    events.push(GameEvent::HarpoonFired { from, direction });
}

// ══════════════════════════════════════════════════════════════
// Spawns & triggers
// ══════════════════════════════════════════════════════════════

fn resolve_power_up_spawn(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    world.power_up_timer += dt;
    if world.power_up_timer < world.rules.spawn_interval_for(world.level) {
        return;
    }
    world.power_up_timer = 0.0;
    let timed = world.power_ups.iter().filter(|p| !p.from_drop).count();
    if timed >= world.rules.max_active_power_ups {
        return;
    }

    let player_at = world.player.position();
    for _ in 0..SPAWN_ATTEMPTS {
        let at = Coord::new(
            world.rng.random_range(SPAWN_MARGIN..WORLD_WIDTH - SPAWN_MARGIN),
            world.rng.random_range(SPAWN_MARGIN..WORLD_HEIGHT - SPAWN_MARGIN),
        );
        if !world.terrain.is_empty(at) || at == player_at {
            continue;
        }
        if world.power_ups.iter().any(|p| p.position() == at) {
            continue;
        }
        let kind = PowerUpKind::ALL[world.rng.random_range(0..PowerUpKind::ALL.len())];
        let power_up = PowerUp::new(at, kind, world.rules.power_up_lifetime);
        collision::spawn_power_up(world, power_up, events);
        return;
    }
    log::debug!("no room for a power-up this time");
}

/// Turn queued rock positions into falling rocks.
///
/// A queued rock stays put when the tile below it is out of reach (floor
/// rows) or when another rock is still falling in its column beneath it.
/// The next scan picks it up again, so a stack comes down one rock at a time.
fn resolve_rock_triggers(world: &mut WorldState, dt: f32, landed: bool, events: &mut Vec<GameEvent>) {
    world.cascade_timer += dt;
    if landed || world.cascade_timer >= world.rules.cascade_interval {
        world.cascade_timer = 0.0;
        world.terrain.check_all_rocks_for_falling();
    }

    let floor_rows = world.rules.floor_rows;
    for at in world.terrain.take_triggered_rock_falls() {
        if !world.terrain.is_rock(at) {
            continue;
        }
        let below = Coord::new(at.x, at.y + 1);
        if !physics::can_fall_to(&world.terrain, below, floor_rows) {
            continue;
        }
        let column_busy = world.rocks.iter()
            .any(|r| !r.is_landed() && r.position().x == at.x && r.position().y > at.y);
        if column_busy {
            continue;
        }
        world.terrain.remove_rock_at(at);
        world.rocks.push(FallingRock::new(at, world.rules.fall_interval));
        log::debug!("rock loosened at {at:?}");
        events.push(GameEvent::RockLoosened { at });
    }
}

// ══════════════════════════════════════════════════════════════
// Win
// ══════════════════════════════════════════════════════════════

fn resolve_win(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.monsters.is_empty() {
        return;
    }
    let bonus = rules::level_clear_bonus(world.level, world.level_time);
    world.award(bonus);
    world.last_clear_bonus = bonus;
    world.totals.levels_cleared += 1;
    world.phase = Phase::LevelCleared;
    log::info!(
        "level {} cleared in {:.1}s: {} kills, bonus {bonus}, score {}",
        world.level, world.level_time, world.level_kills, world.score,
    );
    events.push(GameEvent::LevelCleared { level: world.level, bonus });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::domain::ai::{Monster, MonsterKind};
    use crate::domain::entity::Player;
    use crate::domain::harpoon::HarpoonState;
    use crate::domain::terrain::Terrain;
    use crate::domain::tile::Block;
    use crate::sim::event::DeathCause;

    const DT: f32 = 0.05;

    /// Playing world on solid earth with the player at `at` and one
    /// harmless monster far away in the corner.
    fn playing(at: Coord) -> WorldState {
        let mut rules = RulesConfig::default();
        rules.drop_chance = 0.0;
        rules.spawn_interval = 1_000.0;
        rules.min_spawn_interval = 1_000.0;
        let mut w = WorldState::new(rules, 42);
        w.terrain = Terrain::solid();
        w.player = Player::new(at, &w.rules);
        w.monsters.push(Monster::new(Coord::new(75, 50), MonsterKind::RedMonster, 0.3));
        w.phase = Phase::Playing;
        w
    }

    fn run(w: &mut WorldState, input: FrameInput, ticks: usize) -> Vec<GameEvent> {
        let mut all = vec![];
        for _ in 0..ticks {
            all.extend(step(w, input, DT));
        }
        all
    }

    fn fire() -> FrameInput {
        FrameInput { fire: true, ..Default::default() }
    }

    #[test]
    fn harpoon_kills_monster_two_tiles_away() {
        let mut w = playing(Coord::new(10, 10));
        w.monsters.push(Monster::new(Coord::new(12, 10), MonsterKind::RedMonster, 0.3));
        assert_eq!(w.player.facing, Direction::Right);

        let mut ev = step(&mut w, fire(), DT);
        assert!(ev.contains(&GameEvent::HarpoonFired { from: Coord::new(10, 10), direction: Direction::Right }));
        ev.extend(run(&mut w, FrameInput::default(), 2));

        assert_eq!(w.monsters.len(), 1, "only the far monster is left");
        assert_eq!(w.score, 100);
        assert_eq!(w.level_kills, 1);
        assert!(w.harpoons[0].has_hit());
        assert_eq!(w.harpoons[0].state(), HarpoonState::Retracting);
        assert!(ev.contains(&GameEvent::HarpoonHit { at: Coord::new(12, 10) }));
    }

    #[test]
    fn finished_harpoons_are_removed() {
        let mut w = playing(Coord::new(10, 10));
        step(&mut w, fire(), DT);
        assert_eq!(w.harpoons.len(), 1);
        // 8 out + 8 back at one tile per tick, plus slack
        run(&mut w, FrameInput::default(), 20);
        assert!(w.harpoons.is_empty());
    }

    #[test]
    fn fire_respects_cooldown() {
        let mut w = playing(Coord::new(10, 10));
        step(&mut w, fire(), DT);
        step(&mut w, fire(), DT);
        assert_eq!(w.harpoons.len(), 1);
    }

    #[test]
    fn walking_digs_and_reports_it() {
        let mut w = playing(Coord::new(10, 10));
        let ev = step(&mut w, FrameInput { movement: Some(Direction::Down), ..Default::default() }, DT);
        assert_eq!(w.player.position(), Coord::new(10, 11));
        assert!(w.terrain.is_empty(Coord::new(10, 11)));
        assert!(ev.contains(&GameEvent::Dug { at: Coord::new(10, 11) }));
    }

    #[test]
    fn falling_rock_kills_player() {
        let mut w = playing(Coord::new(30, 25));
        w.terrain.place_rock(Coord::new(30, 20));
        for y in 21..=25 {
            w.terrain.set_block(Coord::new(30, y), Block::Empty);
        }

        let ev = run(&mut w, FrameInput::default(), 120);
        assert!(w.is_game_over());
        assert!(ev.iter().any(|e| matches!(e, GameEvent::PlayerKilled { cause: DeathCause::Rock, .. })));
        assert!(ev.iter().any(|e| matches!(e, GameEvent::RockLoosened { at } if *at == Coord::new(30, 20))));
    }

    #[test]
    fn stacked_rocks_come_down_one_at_a_time() {
        let mut w = playing(Coord::new(5, 5));
        w.terrain.place_rock(Coord::new(30, 19));
        w.terrain.place_rock(Coord::new(30, 20));
        for y in 21..=24 {
            w.terrain.set_block(Coord::new(30, y), Block::Empty);
        }

        for _ in 0..200 {
            step(&mut w, FrameInput::default(), DT);
            assert!(w.rocks.len() <= 1, "cascade must not release the whole stack");
        }
        assert!(w.terrain.is_rock(Coord::new(30, 24)));
        assert!(w.terrain.is_rock(Coord::new(30, 23)));
        assert!(w.terrain.is_empty(Coord::new(30, 19)));
        assert!(w.terrain.is_empty(Coord::new(30, 20)));
        assert!(w.rocks.is_empty());
    }

    #[test]
    fn rock_above_floor_rows_stays() {
        let mut w = playing(Coord::new(5, 5));
        let bottom = WORLD_HEIGHT - w.rules.floor_rows;
        w.terrain.place_rock(Coord::new(40, bottom - 1));
        w.terrain.set_block(Coord::new(40, bottom), Block::Empty);
        run(&mut w, FrameInput::default(), 40);
        assert!(w.rocks.is_empty());
        assert!(w.terrain.is_rock(Coord::new(40, bottom - 1)));
    }

    #[test]
    fn invulnerable_player_survives_monster_contact() {
        let mut w = playing(Coord::new(10, 10));
        w.player.apply_power_up(PowerUpKind::Invulnerability, 5.0);
        w.monsters.push(Monster::new(Coord::new(10, 10), MonsterKind::RedMonster, 0.3));
        step(&mut w, FrameInput::default(), DT);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn pickup_applies_power_up() {
        let mut w = playing(Coord::new(10, 10));
        w.terrain.set_block(Coord::new(11, 10), Block::Empty);
        w.power_ups.push(PowerUp::new(Coord::new(11, 10), PowerUpKind::SpeedBoost, 20.0));
        let ev = step(&mut w, FrameInput { movement: Some(Direction::Right), ..Default::default() }, DT);
        assert!(w.player.has_power_up(PowerUpKind::SpeedBoost));
        assert!(w.power_ups.is_empty());
        assert!(ev.iter().any(|e| matches!(e, GameEvent::PowerUpCollected { .. })));
    }

    #[test]
    fn uncollected_power_up_expires() {
        let mut w = playing(Coord::new(10, 10));
        w.power_ups.push(PowerUp::new(Coord::new(40, 30), PowerUpKind::RapidFire, 0.1));
        let ev = run(&mut w, FrameInput::default(), 3);
        assert!(w.power_ups.is_empty());
        assert!(ev.contains(&GameEvent::PowerUpExpired { at: Coord::new(40, 30) }));
    }

    #[test]
    fn timed_spawn_lands_in_the_interior() {
        let mut w = playing(Coord::new(10, 10));
        w.rules.spawn_interval = 0.1;
        w.rules.min_spawn_interval = 0.1;
        for x in SPAWN_MARGIN..WORLD_WIDTH - SPAWN_MARGIN {
            for y in SPAWN_MARGIN..WORLD_HEIGHT - SPAWN_MARGIN {
                w.terrain.set_block(Coord::new(x, y), Block::Empty);
            }
        }
        run(&mut w, FrameInput::default(), 40);
        assert_eq!(w.power_ups.len(), w.rules.max_active_power_ups);
        for p in &w.power_ups {
            let at = p.position();
            assert!((SPAWN_MARGIN..WORLD_WIDTH - SPAWN_MARGIN).contains(&at.x));
            assert!((SPAWN_MARGIN..WORLD_HEIGHT - SPAWN_MARGIN).contains(&at.y));
        }
    }

    #[test]
    fn kill_drops_do_not_count_toward_the_field_cap() {
        let mut w = playing(Coord::new(10, 10));
        w.rules.spawn_interval = 0.1;
        w.rules.min_spawn_interval = 0.1;
        for x in SPAWN_MARGIN..WORLD_WIDTH - SPAWN_MARGIN {
            for y in SPAWN_MARGIN..WORLD_HEIGHT - SPAWN_MARGIN {
                w.terrain.set_block(Coord::new(x, y), Block::Empty);
            }
        }
        w.power_ups.push(PowerUp::dropped(Coord::new(5, 5), PowerUpKind::RapidFire, 20.0));
        run(&mut w, FrameInput::default(), 40);

        let timed = w.power_ups.iter().filter(|p| !p.from_drop).count();
        assert_eq!(timed, w.rules.max_active_power_ups);
        assert_eq!(w.power_ups.len(), w.rules.max_active_power_ups + 1);
    }

    #[test]
    fn no_spawn_when_interior_is_solid() {
        let mut w = playing(Coord::new(10, 10));
        w.rules.spawn_interval = 0.1;
        w.rules.min_spawn_interval = 0.1;
        run(&mut w, FrameInput::default(), 20);
        assert!(w.power_ups.is_empty());
    }

    #[test]
    fn clearing_the_last_monster_wins_with_bonus() {
        let mut w = playing(Coord::new(10, 10));
        w.monsters.clear();
        let ev = step(&mut w, FrameInput::default(), DT);
        let bonus = rules::level_clear_bonus(1, DT);
        assert!(w.player_won());
        assert_eq!(w.score, bonus);
        assert_eq!(w.totals.levels_cleared, 1);
        assert!(ev.contains(&GameEvent::LevelCleared { level: 1, bonus }));
    }

    #[test]
    fn pause_freezes_the_world() {
        let mut w = playing(Coord::new(10, 10));
        step(&mut w, FrameInput { pause: true, ..Default::default() }, DT);
        assert!(w.is_paused());
        let tick = w.tick;
        run(&mut w, FrameInput { movement: Some(Direction::Down), ..Default::default() }, 10);
        assert_eq!(w.tick, tick);
        assert_eq!(w.player.position(), Coord::new(10, 10));

        step(&mut w, FrameInput { pause: true, ..Default::default() }, DT);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn splash_then_play_then_restart() {
        let mut w = WorldState::new(RulesConfig::default(), 8);
        session::new_run(&mut w);
        step(&mut w, FrameInput::default(), DT);
        assert_eq!(w.phase, Phase::Splash);
        step(&mut w, FrameInput { confirm: true, ..Default::default() }, DT);
        assert_eq!(w.phase, Phase::Playing);

        w.phase = Phase::GameOver;
        w.score = 500;
        let ev = step(&mut w, FrameInput { restart: true, ..Default::default() }, DT);
        assert_eq!(ev, vec![GameEvent::LevelStarted { level: 1 }]);
        assert_eq!(w.score, 0);
        assert_eq!(w.phase, Phase::Splash);
    }

    #[test]
    fn same_seed_same_game() {
        let mut a = WorldState::new(RulesConfig::default(), 77);
        let mut b = WorldState::new(RulesConfig::default(), 77);
        session::new_run(&mut a);
        session::new_run(&mut b);
        let inputs = [
            FrameInput { confirm: true, ..Default::default() },
            FrameInput { movement: Some(Direction::Right), ..Default::default() },
            fire(),
            FrameInput { movement: Some(Direction::Down), ..Default::default() },
        ];
        for i in 0..400 {
            let input = inputs[i % inputs.len()];
            assert_eq!(step(&mut a, input, DT), step(&mut b, input, DT));
        }
        assert_eq!(a.score, b.score);
        let pa: Vec<Coord> = a.monsters.iter().map(|m| m.position()).collect();
        let pb: Vec<Coord> = b.monsters.iter().map(|m| m.position()).collect();
        assert_eq!(pa, pb);
    }
}
