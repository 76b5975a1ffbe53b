//! Keyboard state for the terminal front-end.
//!
//! Movement is level-triggered (held keys keep walking). Everything else
//! fires once per press. Terminals that never report key releases are
//! handled with a hold timeout: a key counts as released once no
//! Press/Repeat has arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::coord::Direction;
use crate::sim::step::FrameInput;

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_FIRE: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_NEXT: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N')];
const KEYS_MUTE: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Checked in this order; the first held direction wins.
const MOVE_BINDINGS: [(&[KeyCode], Direction); 4] = [
    (KEYS_UP, Direction::Up),
    (KEYS_DOWN, Direction::Down),
    (KEYS_LEFT, Direction::Left),
    (KEYS_RIGHT, Direction::Right),
];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh: Vec<KeyCode>,
    ctrl_c: bool,
    /// Set once the terminal has confirmed it sends Release events.
    pub honor_release: bool,
}

impl InputState {
    /// `honor_release` should match what the terminal confirmed at start-up.
    pub fn with_key_release(honor_release: bool) -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh: Vec::with_capacity(8),
            ctrl_c: false,
            honor_release,
        }
    }

    /// Read every pending terminal event without blocking. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh.clear();
        self.ctrl_c = false;

        while event::poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn apply(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            self.ctrl_c = true;
            return;
        }
        match key.kind {
            KeyEventKind::Release => {
                if self.honor_release {
                    self.last_active.remove(&key.code);
                }
            }
            _ => {
                if !self.is_held(key.code, now) {
                    self.fresh.push(key.code);
                }
                self.last_active.insert(key.code, now);
            }
        }
    }

    fn is_held(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .is_some_and(|t| now.duration_since(*t) < HOLD_TIMEOUT)
    }

    fn any_held(&self, codes: &[KeyCode], now: Instant) -> bool {
        codes.iter().any(|c| self.is_held(*c, now))
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh.contains(c))
    }

    /// Intent for this frame, ready for `sim::step`.
    pub fn frame_input(&self) -> FrameInput {
        let now = Instant::now();
        let movement = MOVE_BINDINGS.iter()
            .find(|(keys, _)| self.any_pressed(keys) || self.any_held(keys, now))
            .map(|&(_, dir)| dir);

        FrameInput {
            movement,
            fire: self.any_pressed(KEYS_FIRE),
            pause: self.any_pressed(KEYS_PAUSE),
            confirm: self.any_pressed(KEYS_CONFIRM) || self.any_pressed(KEYS_FIRE),
            restart: self.any_pressed(KEYS_RESTART),
            next_level: self.any_pressed(KEYS_NEXT) || self.any_pressed(KEYS_CONFIRM),
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.ctrl_c || self.any_pressed(KEYS_QUIT)
    }

    pub fn mute_pressed(&self) -> bool {
        self.any_pressed(KEYS_MUTE)
    }
}
