//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

// ── Public Config Struct ──

#[derive(Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub levels_dir: PathBuf,
    pub log_file: PathBuf,
    pub seed: Option<u64>,
    pub sound: bool,
    pub origin: ConfigOrigin,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
}

/// Gameplay tuning. Owned by the session; entities read it at construction.
/// All durations are in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct RulesConfig {
    pub move_interval: f32,
    pub boosted_move_interval: f32,
    pub shoot_cooldown: f32,
    pub rapid_fire_cooldown: f32,
    pub harpoon_range: u32,
    pub harpoon_step: f32,

    pub decision_interval: f32,
    pub decision_step_per_level: f32,
    pub min_decision_interval: f32,

    pub fall_interval: f32,
    pub floor_rows: i32,   // rocks never enter the bottom N rows
    pub cascade_interval: f32,

    pub spawn_interval: f32,
    pub spawn_step_per_level: f32,
    pub min_spawn_interval: f32,
    pub max_active_power_ups: usize,
    pub power_up_lifetime: f32,
    pub drop_chance: f64,

    pub splash_seconds: f32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let p = TomlPlayer::default();
        let m = TomlMonster::default();
        let r = TomlRocks::default();
        let u = TomlPowerUps::default();
        RulesConfig::from_toml(&p, &m, &r, &u, default_splash_seconds())
    }
}

impl RulesConfig {
    fn from_toml(p: &TomlPlayer, m: &TomlMonster, r: &TomlRocks, u: &TomlPowerUps, splash: f32) -> Self {
        RulesConfig {
            move_interval: p.move_interval,
            boosted_move_interval: p.boosted_move_interval,
            shoot_cooldown: p.shoot_cooldown,
            rapid_fire_cooldown: p.rapid_fire_cooldown,
            harpoon_range: p.harpoon_range,
            harpoon_step: p.harpoon_step,
            decision_interval: m.decision_interval,
            decision_step_per_level: m.decision_step_per_level,
            min_decision_interval: m.min_decision_interval,
            fall_interval: r.fall_interval,
            floor_rows: r.floor_rows,
            cascade_interval: r.cascade_interval,
            spawn_interval: u.spawn_interval,
            spawn_step_per_level: u.spawn_step_per_level,
            min_spawn_interval: u.min_spawn_interval,
            max_active_power_ups: u.max_active,
            power_up_lifetime: u.field_lifetime,
            drop_chance: probability(u.drop_chance),
            splash_seconds: splash,
        }
    }

    /// Monster decision cadence for a level (levels are 1-based).
    pub fn decision_interval_for(&self, level: u32) -> f32 {
        let steps = level.saturating_sub(1) as f32;
        (self.decision_interval - steps * self.decision_step_per_level)
            .max(self.min_decision_interval)
    }

    /// Power-up field spawn cadence for a level.
    pub fn spawn_interval_for(&self, level: u32) -> f32 {
        let steps = level.saturating_sub(1) as f32;
        (self.spawn_interval - steps * self.spawn_step_per_level).max(self.min_spawn_interval)
    }
}

/// Clamped to 0..=1. Anything not finite falls back to the default chance.
fn probability(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        default_drop_chance()
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    monster: TomlMonster,
    #[serde(default)]
    rocks: TomlRocks,
    #[serde(default)]
    power_ups: TomlPowerUps,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_splash_seconds")]
    splash_seconds: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_move_interval")]
    move_interval: f32,
    #[serde(default = "default_boosted_move_interval")]
    boosted_move_interval: f32,
    #[serde(default = "default_shoot_cooldown")]
    shoot_cooldown: f32,
    #[serde(default = "default_rapid_fire_cooldown")]
    rapid_fire_cooldown: f32,
    #[serde(default = "default_harpoon_range")]
    harpoon_range: u32,
    #[serde(default = "default_harpoon_step")]
    harpoon_step: f32,
}

#[derive(Deserialize, Debug)]
struct TomlMonster {
    #[serde(default = "default_decision_interval")]
    decision_interval: f32,
    #[serde(default = "default_decision_step")]
    decision_step_per_level: f32,
    #[serde(default = "default_min_decision")]
    min_decision_interval: f32,
}

#[derive(Deserialize, Debug)]
struct TomlRocks {
    #[serde(default = "default_fall_interval")]
    fall_interval: f32,
    #[serde(default = "default_floor_rows")]
    floor_rows: i32,
    #[serde(default = "default_cascade_interval")]
    cascade_interval: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPowerUps {
    #[serde(default = "default_spawn_interval")]
    spawn_interval: f32,
    #[serde(default = "default_spawn_step")]
    spawn_step_per_level: f32,
    #[serde(default = "default_min_spawn")]
    min_spawn_interval: f32,
    #[serde(default = "default_max_active")]
    max_active: usize,
    #[serde(default = "default_field_lifetime")]
    field_lifetime: f32,
    #[serde(default = "default_drop_chance")]
    drop_chance: f64,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_sound")]
    sound: bool,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }
fn default_splash_seconds() -> f32 { 10.0 }

fn default_move_interval() -> f32 { 0.12 }
fn default_boosted_move_interval() -> f32 { 0.06 }
fn default_shoot_cooldown() -> f32 { 1.0 }
fn default_rapid_fire_cooldown() -> f32 { 0.35 }
fn default_harpoon_range() -> u32 { 8 }
fn default_harpoon_step() -> f32 { 0.05 }

fn default_decision_interval() -> f32 { 0.30 }
fn default_decision_step() -> f32 { 0.02 }
fn default_min_decision() -> f32 { 0.15 }

fn default_fall_interval() -> f32 { 0.5 }
fn default_floor_rows() -> i32 { 5 }
fn default_cascade_interval() -> f32 { 0.5 }

fn default_spawn_interval() -> f32 { 30.0 }
fn default_spawn_step() -> f32 { 2.0 }
fn default_min_spawn() -> f32 { 15.0 }
fn default_max_active() -> usize { 2 }
fn default_field_lifetime() -> f32 { 20.0 }
fn default_drop_chance() -> f64 { 0.25 }

fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> String { "digdeep.log".into() }
fn default_sound() -> bool { true }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            splash_seconds: default_splash_seconds(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            move_interval: default_move_interval(),
            boosted_move_interval: default_boosted_move_interval(),
            shoot_cooldown: default_shoot_cooldown(),
            rapid_fire_cooldown: default_rapid_fire_cooldown(),
            harpoon_range: default_harpoon_range(),
            harpoon_step: default_harpoon_step(),
        }
    }
}

impl Default for TomlMonster {
    fn default() -> Self {
        TomlMonster {
            decision_interval: default_decision_interval(),
            decision_step_per_level: default_decision_step(),
            min_decision_interval: default_min_decision(),
        }
    }
}

impl Default for TomlRocks {
    fn default() -> Self {
        TomlRocks {
            fall_interval: default_fall_interval(),
            floor_rows: default_floor_rows(),
            cascade_interval: default_cascade_interval(),
        }
    }
}

impl Default for TomlPowerUps {
    fn default() -> Self {
        TomlPowerUps {
            spawn_interval: default_spawn_interval(),
            spawn_step_per_level: default_spawn_step(),
            min_spawn_interval: default_min_spawn(),
            max_active: default_max_active(),
            field_lifetime: default_field_lifetime(),
            drop_chance: default_drop_chance(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: default_log_file(),
            seed: None,
            sound: default_sound(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, current working directory, then data dirs.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let (toml_cfg, origin) = load_toml(&search_dirs);
        let levels_dir = resolve_dir(&search_dirs, &toml_cfg.general.levels_dir);
        GameConfig::build(toml_cfg, origin, levels_dir)
    }

    fn build(toml_cfg: TomlConfig, mut origin: ConfigOrigin, levels_dir: PathBuf) -> Self {
        let rules = RulesConfig::from_toml(
            &toml_cfg.player,
            &toml_cfg.monster,
            &toml_cfg.rocks,
            &toml_cfg.power_ups,
            toml_cfg.timing.splash_seconds,
        );
        let raw_drop = toml_cfg.power_ups.drop_chance;
        if rules.drop_chance != raw_drop {
            origin.adjusted.push(format!(
                "[power_ups] drop_chance = {raw_drop} is not a probability; using {}",
                rules.drop_chance,
            ));
        }

        GameConfig {
            timing: TimingConfig {
                frame_ms: toml_cfg.timing.frame_ms.max(1),
            },
            rules,
            levels_dir,
            log_file: PathBuf::from(&toml_cfg.general.log_file),
            seed: toml_cfg.general.seed,
            sound: toml_cfg.general.sound,
            origin,
        }
    }

    /// Log where the settings came from. Call after the logger is installed.
    pub fn report(&self) {
        match (&self.origin.path, &self.origin.error) {
            (Some(_), Some(e)) => log::warn!("{e}; using default settings"),
            (Some(path), None) => log::info!("loaded settings from {}", path.display()),
            (None, _) => log::info!("no config.toml found; using default settings"),
        }
        for note in &self.origin.adjusted {
            log::warn!("{note}");
        }
    }
}

/// Absolute paths are taken as-is; relative ones are looked up in each candidate dir.
fn resolve_dir(search_dirs: &[PathBuf], name: &str) -> PathBuf {
    if Path::new(name).is_absolute() {
        return PathBuf::from(name);
    }
    search_dirs.iter()
        .map(|d| d.join(name))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| PathBuf::from(name))
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/digdeep");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/digdeep");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Where the settings came from, reported once logging is up.
#[derive(Debug, Default)]
pub struct ConfigOrigin {
    pub path: Option<PathBuf>,
    pub error: Option<ConfigError>,
    /// Values that were out of range and replaced.
    pub adjusted: Vec<String>,
}

/// First config.toml found wins. A file that fails to load means defaults.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, ConfigOrigin) {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        return match read_toml(&path) {
            Ok(cfg) => (cfg, ConfigOrigin { path: Some(path), ..Default::default() }),
            Err(e) => (TomlConfig::default(), ConfigOrigin { path: Some(path), error: Some(e), ..Default::default() }),
        };
    }
    (TomlConfig::default(), ConfigOrigin::default())
}

fn read_toml(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml(&text).map_err(|e| match e {
        ConfigError::Parse { source, .. } => ConfigError::Parse { path: path.to_path_buf(), source },
        other => other,
    })
}

fn parse_toml(text: &str) -> Result<TomlConfig, ConfigError> {
    toml::from_str::<TomlConfig>(text).map_err(|source| ConfigError::Parse {
        path: PathBuf::new(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = parse_toml("").expect("empty toml parses");
        let p = &cfg.player;
        assert_eq!(p.harpoon_range, 8);
        assert!((p.shoot_cooldown - 1.0).abs() < 1e-6);
        assert_eq!(cfg.rocks.floor_rows, 5);
        assert_eq!(cfg.general.levels_dir, "levels");
        assert!(cfg.general.seed.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse_toml("[player]\nharpoon_range = 5\n[general]\nseed = 42\n").expect("parses");
        assert_eq!(cfg.player.harpoon_range, 5);
        assert!((cfg.player.move_interval - 0.12).abs() < 1e-6);
        assert_eq!(cfg.general.seed, Some(42));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(parse_toml("[player\n"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn drop_chance_is_kept_a_probability() {
        let cfg = parse_toml("[power_ups]\ndrop_chance = 1.5\n").expect("parses");
        let game = GameConfig::build(cfg, ConfigOrigin::default(), PathBuf::from("levels"));
        assert_eq!(game.rules.drop_chance, 1.0);
        assert_eq!(game.origin.adjusted.len(), 1);

        assert_eq!(probability(-0.2), 0.0);
        assert_eq!(probability(f64::NAN), default_drop_chance());
        assert_eq!(probability(0.4), 0.4);

        let fine = GameConfig::build(TomlConfig::default(), ConfigOrigin::default(), PathBuf::from("levels"));
        assert!(fine.origin.adjusted.is_empty());
    }

    #[test]
    fn intervals_shrink_per_level_down_to_floor() {
        let r = RulesConfig::default();
        assert!((r.decision_interval_for(1) - 0.30).abs() < 1e-6);
        assert!((r.decision_interval_for(3) - 0.26).abs() < 1e-5);
        assert!((r.decision_interval_for(50) - 0.15).abs() < 1e-6);
        assert!((r.spawn_interval_for(1) - 30.0).abs() < 1e-6);
        assert!((r.spawn_interval_for(4) - 24.0).abs() < 1e-6);
        assert!((r.spawn_interval_for(20) - 15.0).abs() < 1e-6);
    }
}
