//! Level loading.
//!
//! ## Sources (priority order):
//!   1. `levels/level_<n>.txt` (text layout, see below)
//!   2. Generated layout, deterministic in (run seed, level)
//!
//! A layout file that cannot be read, or that lacks a player start or any
//! monster start, is replaced by the generated layout. The player never
//! sees an error.
//!
//! ## Layout format:
//!   'W' = Solid earth          '.' = Tunnel
//!   'R' = Rock                 'P' = Player start (tunnel)
//!   'M' / 'D' = Monster start (tunnel)
//!
//! Row 0 is the top. Short lines and missing rows are padded with solid
//! earth; anything beyond 80×60 is ignored; unknown characters read as 'W'.
//! Monster kinds are assigned by start order, not by letter.

use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::domain::ai::{Monster, MonsterKind};
use crate::domain::coord::{Coord, WORLD_HEIGHT, WORLD_WIDTH};
use crate::domain::entity::{GameThing, Player};
use crate::domain::rules;
use crate::domain::terrain::Terrain;
use crate::domain::tile::Block;
use crate::error::LevelError;
use super::event::GameEvent;
use super::world::WorldState;

/// Player start of the generated layout.
pub const DEFAULT_PLAYER_START: Coord = Coord::new(10, 10);

/// Monsters in generated layouts keep at least this far from the player.
const SAFE_DISTANCE: f32 = 15.0;

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Replace the level in `world` with `level`. Keeps score and totals.
pub fn setup_level(world: &mut WorldState, level: u32) -> GameEvent {
    let seed = world.layout_seed(level);
    let terrain = load_layout(world.levels_dir.as_deref(), level, seed);

    let interval = world.rules.decision_interval_for(level);
    world.monsters = terrain.monster_starts().iter()
        .enumerate()
        .map(|(i, &pos)| Monster::new(pos, MonsterKind::for_index(i), interval))
        .collect();
    world.player = Player::new(terrain.player_start(), &world.rules);
    world.terrain = terrain;

    world.harpoons.clear();
    world.rocks.clear();
    world.power_ups.clear();
    world.explosions.clear();
    world.level = level;
    world.level_kills = 0;
    world.level_time = 0.0;
    world.power_up_timer = 0.0;
    world.cascade_timer = 0.0;

    log::info!(
        "level {level}: {} monsters, {} rocks, player at {:?}",
        world.monsters.len(),
        world.terrain.rock_count(),
        world.player.position(),
    );
    GameEvent::LevelStarted { level }
}

pub fn layout_path(dir: &Path, level: u32) -> PathBuf {
    dir.join(format!("level_{level}.txt"))
}

/// Layout for `level`: file if present and usable, otherwise generated.
pub fn load_layout(levels_dir: Option<&Path>, level: u32, seed: u64) -> Terrain {
    if let Some(dir) = levels_dir {
        let path = layout_path(dir, level);
        if path.is_file() {
            match read_layout(&path) {
                Ok(t) => {
                    log::info!("loaded layout {}", path.display());
                    return t;
                }
                Err(e) => log::warn!("{e}; generating level {level} instead"),
            }
        } else {
            log::debug!("no layout file {}; generating", path.display());
        }
    }
    generate_layout(level, seed)
}

pub fn read_layout(path: &Path) -> Result<Terrain, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layout(&text)
}

pub fn parse_layout(text: &str) -> Result<Terrain, LevelError> {
    let mut terrain = Terrain::solid();
    let mut player_start = None;

    for (y, line) in text.lines().take(WORLD_HEIGHT as usize).enumerate() {
        for (x, ch) in line.chars().take(WORLD_WIDTH as usize).enumerate() {
            let pos = Coord::new(x as i32, y as i32);
            match ch {
                '.' => { terrain.set_block(pos, Block::Empty); }
                'R' => { terrain.place_rock(pos); }
                'P' => player_start = Some(pos),
                'M' | 'D' => { terrain.add_monster_start(pos); }
                _ => {}
            }
        }
    }

    let start = player_start.ok_or(LevelError::NoPlayerStart)?;
    if terrain.monster_starts().is_empty() {
        return Err(LevelError::NoMonsters);
    }
    terrain.set_player_start(start);
    Ok(terrain)
}

// ══════════════════════════════════════════════════════════════
// Generated layout
// ══════════════════════════════════════════════════════════════

/// Earth with the classic starting tunnels, monster pockets and resting rocks.
pub fn generate_layout(level: u32, seed: u64) -> Terrain {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut t = Terrain::solid();

    for x in 5..25 {
        t.set_block(Coord::new(x, 8), Block::Empty);
        t.set_block(Coord::new(x, 9), Block::Empty);
    }
    for y in 10..20 {
        t.set_block(Coord::new(10, y), Block::Empty);
        t.set_block(Coord::new(20, y), Block::Empty);
    }
    t.set_player_start(DEFAULT_PLAYER_START);

    place_monster_pockets(&mut t, &mut rng, rules::monster_count_for(level));
    place_rocks(&mut t, &mut rng, rules::rock_count_for(level));
    t
}

/// Each monster gets a 5-wide horizontal pocket centred on its start.
fn place_monster_pockets(t: &mut Terrain, rng: &mut Pcg32, wanted: usize) {
    let mut placed = 0;
    for _ in 0..wanted * 50 {
        if placed == wanted {
            break;
        }
        let pos = Coord::new(rng.random_range(4..WORLD_WIDTH - 4), rng.random_range(4..WORLD_HEIGHT - 8));
        if pos.distance_to(DEFAULT_PLAYER_START) < SAFE_DISTANCE {
            continue;
        }
        if t.monster_starts().iter().any(|m| m.distance_to(pos) < 4.0) {
            continue;
        }
        for dx in -2..=2 {
            t.set_block(Coord::new(pos.x + dx, pos.y), Block::Empty);
        }
        t.add_monster_start(pos);
        placed += 1;
    }
}

/// Rocks only go on solid earth with solid earth beneath, so a fresh level
/// starts stable and every fall is caused by digging.
fn place_rocks(t: &mut Terrain, rng: &mut Pcg32, wanted: usize) {
    let mut placed = 0;
    for _ in 0..wanted * 50 {
        if placed == wanted {
            break;
        }
        let pos = Coord::new(rng.random_range(1..WORLD_WIDTH - 1), rng.random_range(2..WORLD_HEIGHT - 8));
        let below = Coord::new(pos.x, pos.y + 1);
        if t.block_at(pos) != Block::Solid || t.block_at(below) != Block::Solid {
            continue;
        }
        if pos.distance_to(DEFAULT_PLAYER_START) < 3.0 {
            continue;
        }
        t.place_rock(pos);
        placed += 1;
    }
}
