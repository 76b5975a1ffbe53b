//! Sound effects, synthesized into in-memory WAV buffers at start-up and
//! played fire-and-forget through rodio.
//!
//! Build without the `sound` feature to drop rodio; the stub engine keeps
//! the same API and does nothing.

use crate::sim::event::GameEvent;

/// Every effect the game can play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    HarpoonFire,
    HarpoonHit,
    MonsterDestroyed,
    Dig,
    RockLanded,
    PowerUp,
    LevelComplete,
    PlayerHit,
}

impl Sfx {
    pub const ALL: [Sfx; 8] = [
        Sfx::HarpoonFire,
        Sfx::HarpoonHit,
        Sfx::MonsterDestroyed,
        Sfx::Dig,
        Sfx::RockLanded,
        Sfx::PowerUp,
        Sfx::LevelComplete,
        Sfx::PlayerHit,
    ];

    /// Events without a sound map to None.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        Some(match event {
            GameEvent::HarpoonFired { .. } => Sfx::HarpoonFire,
            GameEvent::HarpoonHit { .. } => Sfx::HarpoonHit,
            GameEvent::MonsterKilled { .. } => Sfx::MonsterDestroyed,
            GameEvent::Dug { .. } => Sfx::Dig,
            GameEvent::RockLanded { .. } => Sfx::RockLanded,
            GameEvent::PowerUpCollected { .. } => Sfx::PowerUp,
            GameEvent::LevelCleared { .. } => Sfx::LevelComplete,
            GameEvent::PlayerKilled { .. } => Sfx::PlayerHit,
            _ => return None,
        })
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;
    use crate::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        /// Indexed by position in `Sfx::ALL`.
        buffers: Vec<Arc<[u8]>>,
        muted: bool,
    }

    impl SoundEngine {
        /// None when no output device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("audio disabled: {e}");
                    return None;
                }
            };
            let buffers: Vec<Arc<[u8]>> = Sfx::ALL.iter()
                .map(|&sfx| Arc::from(make_wav(&synthesize(sfx))))
                .collect();
            log::debug!("audio ready, {} effects", Sfx::ALL.len());
            Some(SoundEngine { _stream: stream, handle, buffers, muted: false })
        }

        pub fn play(&self, sfx: Sfx) {
            if self.muted {
                return;
            }
            let Some(idx) = Sfx::ALL.iter().position(|&s| s == sfx) else { return };
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            if let Ok(src) = Decoder::new(Cursor::new(Arc::clone(&self.buffers[idx]))) {
                sink.append(src);
                sink.detach();
            }
        }

        pub fn play_events(&self, events: &[GameEvent]) {
            for sfx in events.iter().filter_map(Sfx::for_event) {
                self.play(sfx);
            }
        }

        pub fn toggle_mute(&mut self) -> bool {
            self.muted = !self.muted;
            self.muted
        }

        pub fn is_muted(&self) -> bool {
            self.muted
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis: mono f32 samples in -1.0..=1.0
    // ════════════════════════════════════════════════════════════

    fn synthesize(sfx: Sfx) -> Vec<f32> {
        match sfx {
            Sfx::HarpoonFire => sweep(900.0, 1800.0, 0.08, 0.0, 0.22),
            Sfx::HarpoonHit => sweep(1400.0, 700.0, 0.06, 0.2, 0.25),
            Sfx::MonsterDestroyed => sweep(500.0, 60.0, 0.30, 0.7, 0.30),
            Sfx::Dig => sweep(260.0, 180.0, 0.05, 0.6, 0.12),
            Sfx::RockLanded => sweep(120.0, 40.0, 0.20, 0.8, 0.35),
            Sfx::PowerUp => arpeggio(&[784.0, 988.0, 1175.0, 1568.0], 0.05, 0.25),
            Sfx::LevelComplete => arpeggio(&[523.0, 659.0, 784.0, 1047.0, 1047.0], 0.12, 0.30),
            Sfx::PlayerHit => arpeggio(&[440.0, 370.0, 311.0, 220.0], 0.14, 0.30),
        }
    }

    /// Linear pitch glide with an optional share of noise, fading out.
    fn sweep(from: f32, to: f32, seconds: f32, noise: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * seconds) as usize;
        let mut lcg: u32 = 0x2545_F491;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
                lcg = lcg.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                let white = (lcg >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
                let tone = (phase * TAU).sin();
                (tone * (1.0 - noise) + white * noise) * (1.0 - t) * volume
            })
            .collect()
    }

    /// Square-ish notes played back to back.
    fn arpeggio(notes: &[f32], note_seconds: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * note_seconds) as usize;
        let mut out = Vec::with_capacity(n * notes.len());
        for &freq in notes {
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).sqrt() * 0.6;
                let wave = (t * freq * TAU).sin() * 0.75 + (t * freq * 3.0 * TAU).sin() * 0.25;
                out.push(wave * env * volume);
            }
        }
        out
    }

    /// 16-bit PCM mono WAV.
    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let data_len = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_len as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_len).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_len.to_le_bytes());
        for &s in samples {
            buf.extend_from_slice(&((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine {
    muted: bool,
}

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine { muted: false }) }
    pub fn play(&self, _sfx: Sfx) {}
    pub fn play_events(&self, _events: &[GameEvent]) {}
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }
    pub fn is_muted(&self) -> bool { self.muted }
}
