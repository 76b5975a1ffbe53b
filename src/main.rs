/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use config::GameConfig;
use sim::session;
use sim::step::{self, FrameInput};
use sim::world::WorldState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(4);

fn main() {
    let config = GameConfig::load();
    init_logging(&config.log_file);
    config.report();

    let seed = config.seed.unwrap_or_else(clock_seed);
    log::info!("starting run with seed {seed}");

    let mut world = WorldState::new(config.rules.clone(), seed);
    world.levels_dir = Some(config.levels_dir.clone());
    session::new_run(&mut world);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut sound = if config.sound { SoundEngine::new() } else { None };

    let result = game_loop(&mut world, &mut renderer, sound.as_mut(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Game error: {e}");
    }

    let t = &world.totals;
    log::info!(
        "session over: score {}, {} levels cleared, {} monsters, {:.0}s played",
        world.score, t.levels_cleared, t.monsters_killed, t.play_time,
    );
    println!();
    if world.is_game_over() {
        println!("Game over on level {}.", world.level);
    } else if world.player_won() {
        println!("Level {} cleared.", world.level);
    }
    println!("Thanks for playing Dig Deep!");
    println!("Final Score: {}  (level {}, {} monsters)", world.score, world.level, t.monsters_killed);
}

/// Fixed-timestep loop: input is drained every frame, the world advances
/// once per `frame_ms`, and one-shot presses between ticks are held until
/// the next tick consumes them.
fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    mut sound: Option<&mut SoundEngine>,
    config: &GameConfig,
) -> std::io::Result<()> {
    let mut kb = InputState::with_key_release(renderer.reports_key_release());
    let tick_rate = Duration::from_millis(config.timing.frame_ms);
    let dt = tick_rate.as_secs_f32();
    let mut last_tick = Instant::now();
    let mut pending = FrameInput::default();

    loop {
        kb.drain_events();
        if kb.quit_requested() {
            log::info!("quit requested");
            break;
        }
        if world.is_paused() && kb.mute_pressed() {
            if let Some(sfx) = sound.as_deref_mut() {
                let muted = sfx.toggle_mute();
                log::debug!("sound muted: {muted}");
            }
        }
        pending = merge(pending, kb.frame_input());

        if last_tick.elapsed() >= tick_rate {
            let events = step::step(world, pending, dt);
            pending = FrameInput::default();
            last_tick = Instant::now();

            if let Some(sfx) = sound.as_deref() {
                sfx.play_events(&events);
            }
            renderer.absorb(&events, dt);
        }

        let muted = sound.as_deref().map_or(true, |s| s.is_muted());
        renderer.render(world, muted)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Edge flags accumulate; the latest movement wins.
fn merge(held: FrameInput, now: FrameInput) -> FrameInput {
    FrameInput {
        movement: now.movement.or(held.movement),
        fire: held.fire || now.fire,
        pause: held.pause ^ now.pause,
        confirm: held.confirm || now.confirm,
        restart: held.restart || now.restart,
        next_level: held.next_level || now.next_level,
    }
}

/// The terminal is in raw mode, so log lines go to a file instead.
fn init_logging(path: &Path) {
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("logging disabled: cannot create {}: {e}", path.display());
            return;
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5EED)
}
