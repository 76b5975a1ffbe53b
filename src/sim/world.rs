//! WorldState: the complete state of a running session.
//!
//! ## Ownership
//!
//! The session owns the terrain and every entity collection. Entities never
//! hold references to each other or to the terrain. Whatever they need
//! (the terrain, the player's position, the RNG) is lent to their `update`
//! for the duration of the call.
//!
//! ## Phases
//!
//! ```text
//!   Splash ──(timeout | confirm)──▶ Playing ⇄ Paused
//!   Playing ──(loss)──▶ GameOver ──(restart)──▶ Splash
//!   Playing ──(win)───▶ LevelCleared ──(next)──▶ Playing
//!                                    └─(restart)──▶ Splash
//! ```

use std::path::PathBuf;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::RulesConfig;
use crate::domain::ai::Monster;
use crate::domain::coord::Coord;
use crate::domain::entity::{Player, PowerUp};
use crate::domain::harpoon::Harpoon;
use crate::domain::physics::FallingRock;
use crate::domain::terrain::Terrain;

pub const EXPLOSION_SECONDS: f32 = 1.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Splash,
    Playing,
    Paused,
    GameOver,
    LevelCleared,
}

/// A short-lived blast drawn where something died.
#[derive(Clone, Copy, Debug)]
pub struct Explosion {
    pub at: Coord,
    pub timer: f32,
}

impl Explosion {
    pub fn new(at: Coord) -> Self {
        Explosion { at, timer: EXPLOSION_SECONDS }
    }

    /// 0.0 when fresh, 1.0 when about to vanish.
    pub fn progress(&self) -> f32 {
        1.0 - (self.timer / EXPLOSION_SECONDS).clamp(0.0, 1.0)
    }
}

/// Run-wide counters. Reset by restart, kept across levels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CampaignTotals {
    pub levels_cleared: u32,
    pub monsters_killed: u32,
    pub play_time: f32,
}

pub struct WorldState {
    // ── Level ──
    pub terrain: Terrain,
    pub player: Player,
    pub monsters: Vec<Monster>,
    pub harpoons: Vec<Harpoon>,
    pub rocks: Vec<FallingRock>,
    pub power_ups: Vec<PowerUp>,
    pub explosions: Vec<Explosion>,

    // ── Session ──
    pub phase: Phase,
    pub level: u32,
    pub score: u32,
    pub level_kills: u32,
    pub level_time: f32,
    pub last_clear_bonus: u32,
    pub totals: CampaignTotals,

    // ── Timers ──
    pub splash_timer: f32,
    pub power_up_timer: f32,
    pub cascade_timer: f32,
    pub tick: u64,

    // ── Setup ──
    pub rules: RulesConfig,
    pub levels_dir: Option<PathBuf>,
    pub seed: u64,
    pub rng: Pcg32,
}

impl WorldState {
    /// Empty session on the splash screen. Call `session::new_run` to load level 1.
    pub fn new(rules: RulesConfig, seed: u64) -> Self {
        let terrain = Terrain::solid();
        let player = Player::new(terrain.player_start(), &rules);
        WorldState {
            terrain,
            player,
            monsters: vec![],
            harpoons: vec![],
            rocks: vec![],
            power_ups: vec![],
            explosions: vec![],
            phase: Phase::Splash,
            level: 1,
            score: 0,
            level_kills: 0,
            level_time: 0.0,
            last_clear_bonus: 0,
            totals: CampaignTotals::default(),
            splash_timer: 0.0,
            power_up_timer: 0.0,
            cascade_timer: 0.0,
            tick: 0,
            rules,
            levels_dir: None,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn player_won(&self) -> bool {
        self.phase == Phase::LevelCleared
    }

    pub fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    /// Seed for this level's generated layout; stable for a given run seed.
    pub fn layout_seed(&self, level: u32) -> u64 {
        self.seed ^ (level as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}
