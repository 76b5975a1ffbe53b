/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame is composed into `front`, compared cell by cell with `back`
/// (the previous frame), and only changed cells are written. Commands are
/// queued and flushed once, then the buffers swap.
///
/// One world tile is two terminal columns wide so the map keeps a roughly
/// square aspect. The camera follows the player and is clamped to the map.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::ai::{MonsterKind, MonsterState};
use crate::domain::coord::{Coord, Direction, WORLD_HEIGHT, WORLD_WIDTH};
use crate::domain::entity::{GameThing, PowerUpKind};
use crate::domain::tile::Block;
use crate::sim::event::GameEvent;
use crate::sim::world::{Phase, WorldState};

const BASE_BG: Color = Color::Rgb { r: 18, g: 14, b: 10 };
const EARTH_FG: Color = Color::Rgb { r: 150, g: 95, b: 45 };
const EARTH_BG: Color = Color::Rgb { r: 95, g: 60, b: 30 };
const TUNNEL_BG: Color = Color::Rgb { r: 12, g: 10, b: 8 };
const ROCK_FG: Color = Color::Rgb { r: 165, g: 165, b: 170 };
const HUD_FG: Color = Color::Rgb { r: 230, g: 220, b: 180 };
const PANEL_BG: Color = Color::Rgb { r: 30, g: 30, b: 60 };

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 1;
/// HUD on top, help line below the map.
const RESERVED_ROWS: usize = 2;

const POPUP_SECONDS: f32 = 0.8;

// ── Cell / FrameBuffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };
    /// Differs from every real cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '\u{0}', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(width: usize, height: usize) -> Self {
        FrameBuffer { width, height, cells: vec![Cell::BLANK; width * height] }
    }

    fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            *self = FrameBuffer::new(width, height);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Two-column glyph for one world tile.
    fn put_tile(&mut self, col: usize, row: usize, glyph: [char; 2], fg: Color, bg: Color) {
        self.set(col, row, Cell::new(glyph[0], fg, bg));
        self.set(col + 1, row, Cell::new(glyph[1], fg, bg));
    }
}

// ── Camera ──

/// Top-left world tile of the viewport.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: i32,
    pub view_h: i32,
}

impl Camera {
    /// Centre on `target`, clamped so the view never leaves the map.
    pub fn follow(&mut self, target: Coord, view_w: i32, view_h: i32) {
        self.view_w = view_w.clamp(1, WORLD_WIDTH);
        self.view_h = view_h.clamp(1, WORLD_HEIGHT);
        self.x = (target.x - self.view_w / 2).clamp(0, WORLD_WIDTH - self.view_w);
        self.y = (target.y - self.view_h / 2).clamp(0, WORLD_HEIGHT - self.view_h);
    }

    /// Screen tile for a world position, if it is in view.
    pub fn to_screen(&self, pos: Coord) -> Option<(usize, usize)> {
        let sx = pos.x - self.x;
        let sy = pos.y - self.y;
        if sx < 0 || sy < 0 || sx >= self.view_w || sy >= self.view_h {
            return None;
        }
        Some((sx as usize, sy as usize))
    }
}

struct Popup {
    at: Coord,
    points: u32,
    timer: f32,
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    camera: Camera,
    shake_timer: f32,
    shake_intensity: f32,
    popups: Vec<Popup>,
    /// Terminal accepted the keyboard enhancement and sends key releases.
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            camera: Camera::default(),
            shake_timer: 0.0,
            shake_intensity: 0.0,
            popups: Vec::new(),
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.key_release = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.key_release {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::debug!("key release events: {}", self.key_release);
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size(true)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }

    /// Feed this frame's events: screen shake and score popups.
    pub fn absorb(&mut self, events: &[GameEvent], dt: f32) {
        self.shake_timer = (self.shake_timer - dt).max(0.0);
        for p in self.popups.iter_mut() {
            p.timer -= dt;
        }
        self.popups.retain(|p| p.timer > 0.0);

        for ev in events {
            match *ev {
                GameEvent::ScreenShake { intensity, duration } => {
                    if intensity >= self.shake_intensity || self.shake_timer <= 0.0 {
                        self.shake_intensity = intensity;
                        self.shake_timer = duration;
                    }
                }
                GameEvent::ScorePopup { at, points } => {
                    self.popups.push(Popup { at, points, timer: POPUP_SECONDS });
                }
                GameEvent::LevelStarted { .. } => {
                    self.popups.clear();
                    self.shake_timer = 0.0;
                }
                _ => {}
            }
        }
    }

    fn sync_size(&mut self, force: bool) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (tw, th) = (tw as usize, th as usize);
        if force || tw != self.term_w || th != self.term_h {
            self.term_w = tw;
            self.term_h = th;
            self.front.resize(tw, th);
            self.back.resize(tw, th);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }
        Ok(())
    }

    pub fn render(&mut self, world: &WorldState, muted: bool) -> io::Result<()> {
        self.sync_size(false)?;

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.last_phase = Some(world.phase);
        }

        let view_w = (self.term_w / CELL_W) as i32;
        let view_h = self.term_h.saturating_sub(RESERVED_ROWS) as i32;
        self.camera.follow(world.player.position(), view_w, view_h);

        self.front.clear();
        self.compose_map(world);
        self.compose_hud(world);

        match world.phase {
            Phase::Splash => self.compose_splash(world),
            Phase::Paused => self.compose_paused(muted),
            Phase::GameOver => self.compose_game_over(world),
            Phase::LevelCleared => self.compose_level_cleared(world),
            Phase::Playing => {}
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        self.writer.flush()
    }

    // ══════════════════════════════════════════════════════════════
    // Map
    // ══════════════════════════════════════════════════════════════

    fn shake_offset(&self, tick: u64) -> i32 {
        if self.shake_timer <= 0.0 {
            return 0;
        }
        let amp = (self.shake_intensity / 2.5).round().max(1.0) as i32;
        if tick % 2 == 0 { amp } else { -amp }
    }

    /// World tile → terminal (column, row), shake applied.
    fn screen_cell(&self, pos: Coord, shake: i32) -> Option<(usize, usize)> {
        let (sx, sy) = self.camera.to_screen(pos)?;
        let col = sx as i32 * CELL_W as i32 + shake;
        if col < 0 {
            return None;
        }
        Some((col as usize, sy + MAP_ROW))
    }

    fn compose_map(&mut self, w: &WorldState) {
        let shake = self.shake_offset(w.tick);
        let cam = self.camera;

        for sy in 0..cam.view_h {
            for sx in 0..cam.view_w {
                let pos = Coord::new(cam.x + sx, cam.y + sy);
                let Some((col, row)) = self.screen_cell(pos, shake) else { continue };
                let (glyph, fg, bg) = match w.terrain.block_at(pos) {
                    Block::Solid => (earth_glyph(pos), EARTH_FG, EARTH_BG),
                    Block::Empty => ([' ', ' '], Color::White, TUNNEL_BG),
                    Block::Rock => (['▐', '▌'], ROCK_FG, EARTH_BG),
                };
                self.front.put_tile(col, row, glyph, fg, bg);
            }
        }

        for pu in &w.power_ups {
            let lit = (pu.pulse_timer * 4.0) as u32 % 2 == 0;
            let fg = if lit { power_up_color(pu.kind) } else { Color::DarkGrey };
            self.draw(pu.position(), shake, power_up_glyph(pu.kind), fg);
        }

        for rock in &w.rocks {
            self.draw(rock.position(), shake, ['▓', '▓'], ROCK_FG);
        }

        for h in &w.harpoons {
            let shaft = match h.direction {
                Direction::Left | Direction::Right => ['─', '─'],
                Direction::Up | Direction::Down => ['│', ' '],
            };
            let tip = match h.direction {
                Direction::Right => ['─', '>'],
                Direction::Left => ['<', '─'],
                Direction::Up => ['^', ' '],
                Direction::Down => ['v', ' '],
            };
            let fg = if h.has_hit() { Color::Red } else { Color::Cyan };
            let tip_at = h.tip();
            for seg in h.segments() {
                self.draw(seg, shake, if seg == tip_at { tip } else { shaft }, fg);
            }
        }

        for m in &w.monsters {
            let (glyph, fg) = monster_look(m.kind, m.state());
            self.draw(m.position(), shake, glyph, fg);
        }

        if w.player.is_active() {
            let blink = w.player.is_invulnerable() && w.tick % 6 < 3;
            let fg = if blink { Color::Yellow } else { Color::White };
            let glyph = match w.player.facing {
                Direction::Up => ['/', '\\'],
                Direction::Down => ['\\', '/'],
                Direction::Left => ['<', 'o'],
                Direction::Right => ['o', '>'],
            };
            self.draw(w.player.position(), shake, glyph, fg);
        }

        for e in &w.explosions {
            let p = e.progress();
            let (glyph, fg) = if p < 0.33 {
                (['#', '#'], Color::White)
            } else if p < 0.66 {
                (['*', '*'], Color::Yellow)
            } else {
                (['.', '.'], Color::Red)
            };
            self.draw(e.at, shake, glyph, fg);
        }

        let labels: Vec<(usize, usize, String)> = self.popups.iter()
            .filter_map(|pop| {
                let (col, row) = self.screen_cell(pop.at, shake)?;
                let rise = ((POPUP_SECONDS - pop.timer) * 2.0) as usize;
                let row = row.checked_sub(rise + 1).filter(|r| *r >= MAP_ROW)?;
                Some((col, row, format!("+{}", pop.points)))
            })
            .collect();
        for (col, row, text) in labels {
            let bg = self.front.get(col, row).bg;
            self.front.put_str(col, row, &text, Color::Yellow, bg);
        }
    }

    /// Sprite on top of whatever tile is there; keeps the tile background.
    fn draw(&mut self, pos: Coord, shake: i32, glyph: [char; 2], fg: Color) {
        let Some((col, row)) = self.screen_cell(pos, shake) else { return };
        let bg = self.front.get(col, row).bg;
        self.front.put_tile(col, row, glyph, fg, bg);
    }

    // ══════════════════════════════════════════════════════════════
    // HUD & overlays
    // ══════════════════════════════════════════════════════════════

    fn compose_hud(&mut self, w: &WorldState) {
        let width = self.front.width;
        for x in 0..width {
            self.front.set(x, HUD_ROW, Cell::new(' ', HUD_FG, PANEL_BG));
        }
        let hunting = w.monsters.iter().filter(|m| m.state() != MonsterState::Patrolling).count();
        let mut hud = format!(
            " LEVEL {}  SCORE {:<7} MONSTERS {} ({} hunting)  TIME {:>4.0}s ",
            w.level, w.score, w.monsters.len(), hunting, w.level_time,
        );
        for kind in PowerUpKind::ALL {
            if w.player.has_power_up(kind) {
                hud.push_str(&format!(" {}:{:.0}", kind.label(), w.player.power_up_remaining(kind).ceil()));
            }
        }
        self.front.put_str(0, HUD_ROW, &hud, HUD_FG, PANEL_BG);

        let help_row = self.front.height.saturating_sub(1);
        let help = " ←↑↓→/WASD move+dig  SPACE harpoon  P pause  Q quit ";
        self.front.put_str(0, help_row, help, Color::DarkGrey, BASE_BG);
    }

    /// Centered box of text lines; first line is the title.
    fn compose_panel(&mut self, lines: &[String], title_fg: Color) {
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let top = (self.front.height.saturating_sub(lines.len() + 2)) / 2;
        let left = self.front.width.saturating_sub(inner) / 2;
        for row in top..top + lines.len() + 2 {
            for x in left..left + inner {
                self.front.set(x, row, Cell::new(' ', Color::White, PANEL_BG));
            }
        }
        for (i, line) in lines.iter().enumerate() {
            let fg = if i == 0 { title_fg } else { Color::White };
            let x = left + (inner - line.chars().count()) / 2;
            self.front.put_str(x, top + 1 + i, line, fg, PANEL_BG);
        }
    }

    fn compose_splash(&mut self, w: &WorldState) {
        let left = (w.rules.splash_seconds - w.splash_timer).max(0.0).ceil();
        let lines = [
            "D I G   D E E P".to_string(),
            String::new(),
            "Dig tunnels. Harpoon monsters. Mind the rocks.".to_string(),
            "Arrows/WASD move and dig, SPACE fires the harpoon".to_string(),
            "P pauses, M mutes while paused, Q quits".to_string(),
            String::new(),
            format!("ENTER to start ({left:.0})"),
        ];
        self.compose_panel(&lines, Color::Yellow);
    }

    fn compose_paused(&mut self, muted: bool) {
        let lines = [
            "PAUSED".to_string(),
            String::new(),
            "P resume".to_string(),
            format!("M sound: {}", if muted { "off" } else { "on" }),
            "Q quit".to_string(),
        ];
        self.compose_panel(&lines, Color::Cyan);
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let t = &w.totals;
        let lines = [
            "GAME OVER".to_string(),
            String::new(),
            format!("Score {}   Level {}", w.score, w.level),
            format!(
                "Levels cleared {}   Monsters {}   Time {:.0}s",
                t.levels_cleared, t.monsters_killed, t.play_time,
            ),
            String::new(),
            "R restart   Q quit".to_string(),
        ];
        self.compose_panel(&lines, Color::Red);
    }

    fn compose_level_cleared(&mut self, w: &WorldState) {
        let lines = [
            format!("LEVEL {} CLEARED", w.level),
            String::new(),
            format!("Monsters {}   Time {:.0}s", w.level_kills, w.level_time),
            format!("Bonus {}   Score {}", w.last_clear_bonus, w.score),
            String::new(),
            "N / ENTER next level   R restart   Q quit".to_string(),
        ];
        self.compose_panel(&lines, Color::Green);
    }
}

// ── Glyphs ──

/// Speckled earth so large solid areas don't look flat.
fn earth_glyph(pos: Coord) -> [char; 2] {
    match (pos.x * 7 + pos.y * 13) % 5 {
        0 => ['░', '▒'],
        1 => ['▒', '░'],
        _ => ['░', '░'],
    }
}

fn monster_look(kind: MonsterKind, state: MonsterState) -> ([char; 2], Color) {
    let glyph = match kind {
        MonsterKind::RedMonster => ['(', ')'],
        MonsterKind::GreenDragon => ['<', '8'],
    };
    let fg = match (kind, state) {
        (MonsterKind::RedMonster, MonsterState::Patrolling) => Color::DarkRed,
        (MonsterKind::RedMonster, MonsterState::Chasing) => Color::Red,
        (MonsterKind::RedMonster, MonsterState::Aggressive) => Color::Magenta,
        (MonsterKind::GreenDragon, MonsterState::Patrolling) => Color::DarkGreen,
        (MonsterKind::GreenDragon, MonsterState::Chasing) => Color::Green,
        (MonsterKind::GreenDragon, MonsterState::Aggressive) => Color::Yellow,
    };
    (glyph, fg)
}

fn power_up_glyph(kind: PowerUpKind) -> [char; 2] {
    match kind {
        PowerUpKind::SpeedBoost => ['»', 'S'],
        PowerUpKind::ExtendedRange => ['»', 'R'],
        PowerUpKind::RapidFire => ['»', 'F'],
        PowerUpKind::Invulnerability => ['»', 'I'],
    }
}

fn power_up_color(kind: PowerUpKind) -> Color {
    match kind {
        PowerUpKind::SpeedBoost => Color::Cyan,
        PowerUpKind::ExtendedRange => Color::Blue,
        PowerUpKind::RapidFire => Color::Yellow,
        PowerUpKind::Invulnerability => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_centres_and_clamps() {
        let mut cam = Camera::default();
        cam.follow(Coord::new(40, 30), 20, 10);
        assert_eq!((cam.x, cam.y), (30, 25));

        cam.follow(Coord::new(1, 1), 20, 10);
        assert_eq!((cam.x, cam.y), (0, 0));

        cam.follow(Coord::new(79, 59), 20, 10);
        assert_eq!((cam.x, cam.y), (WORLD_WIDTH - 20, WORLD_HEIGHT - 10));
    }

    #[test]
    fn oversized_terminal_shows_whole_map() {
        let mut cam = Camera::default();
        cam.follow(Coord::new(70, 50), 500, 500);
        assert_eq!((cam.x, cam.y, cam.view_w, cam.view_h), (0, 0, WORLD_WIDTH, WORLD_HEIGHT));
    }

    #[test]
    fn to_screen_rejects_out_of_view() {
        let mut cam = Camera::default();
        cam.follow(Coord::new(40, 30), 20, 10);
        assert_eq!(cam.to_screen(Coord::new(30, 25)), Some((0, 0)));
        assert_eq!(cam.to_screen(Coord::new(29, 25)), None);
        assert_eq!(cam.to_screen(Coord::new(50, 25)), None);
    }

    #[test]
    fn framebuffer_clips_writes() {
        let mut fb = FrameBuffer::new(4, 2);
        fb.put_str(2, 0, "abcdef", Color::White, BASE_BG);
        assert_eq!(fb.get(3, 0).ch, 'b');
        assert_eq!(fb.get(9, 9), Cell::BLANK);
    }
}
