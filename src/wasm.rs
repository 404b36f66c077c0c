//! WebAssembly bindings via wasm-bindgen for browser integration.
//!
//! This module is only compiled when the `web` feature is enabled.
//!
//! # Usage
//!
//! Build with wasm-pack:
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! # JavaScript Example
//!
//! ```javascript
//! import init, { voicepool_init, WebVoicePool } from './voicepool.js';
//!
//! await init();
//! voicepool_init();
//!
//! const pool = new WebVoicePool(48000);
//! const laser = pool.register_clip("laser", 0.4);
//! const voice = pool.play_sound(laser, 1.0, 1.0, 0.0, false);
//!
//! // Once per animation frame, mirror state onto Web Audio nodes
//! const finished = pool.tick(dt);
//! const state = pool.voice_state(voice);
//! ```

use wasm_bindgen::prelude::*;

use crate::bus::Bus;
use crate::error::PlayError;
use crate::host::{HostPool, VoiceState};
use crate::voice::PlaybackParams;

// ═══════════════════════════════════════════════════════════════════════════
// Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the wasm module. Call this once before using any other functions.
/// Sets up panic hooks and console logging.
#[wasm_bindgen]
pub fn voicepool_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Readback Data
// ═══════════════════════════════════════════════════════════════════════════

/// Voice state for the per-frame mirror pass.
#[wasm_bindgen]
#[derive(Clone, Copy)]
pub struct WebVoiceState {
    pub voice_id: u32,
    pub has_clip: bool,
    pub clip_id: u32,
    pub volume: f32,
    pub pitch: f32,
    pub pan: f32,
    pub looping: bool,
    pub playing: bool,
    pub elapsed: f64,
    pub is_music: bool,
}

impl From<VoiceState> for WebVoiceState {
    fn from(s: VoiceState) -> Self {
        Self {
            voice_id: s.voice_id,
            has_clip: s.clip_id.is_some(),
            clip_id: s.clip_id.unwrap_or(0),
            volume: s.volume,
            pitch: s.pitch,
            pan: s.pan,
            looping: s.looping,
            playing: s.playing,
            elapsed: s.elapsed,
            is_music: s.is_music,
        }
    }
}

fn to_js_error(e: PlayError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// ═══════════════════════════════════════════════════════════════════════════
// Pool
// ═══════════════════════════════════════════════════════════════════════════

/// Voice pool driven from the browser's frame loop.
#[wasm_bindgen]
pub struct WebVoicePool {
    inner: HostPool,
}

#[wasm_bindgen]
impl WebVoicePool {
    /// Create a pool with default configuration. Unusable sample rates
    /// fall back to 48 kHz.
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> WebVoicePool {
        Self {
            inner: HostPool::new(Default::default(), sample_rate),
        }
    }

    /// Create a pool from a TOML configuration string.
    pub fn with_config(config_toml: &str, sample_rate: f64) -> Result<WebVoicePool, JsValue> {
        HostPool::from_toml(config_toml, sample_rate)
            .map(|inner| Self { inner })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clips
    // ─────────────────────────────────────────────────────────────────────────

    pub fn register_clip(&mut self, name: &str, duration: f64) -> u32 {
        self.inner.register_clip(name, duration)
    }

    pub fn unregister_clip(&mut self, clip_id: u32) -> bool {
        self.inner.unregister_clip(clip_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Playback
    // ─────────────────────────────────────────────────────────────────────────

    /// Play a clip on a pooled voice. Throws on an unknown clip or a full pool.
    pub fn play_sound(
        &mut self,
        clip_id: u32,
        volume: f32,
        pitch: f32,
        pan: f32,
        looping: bool,
    ) -> Result<u32, JsValue> {
        let params = PlaybackParams::new()
            .volume(volume)
            .pitch(pitch)
            .pan(pan)
            .looping(looping);
        self.inner.play_sound(clip_id, params).map_err(to_js_error)
    }

    /// Play a looping background track.
    pub fn play_background(&mut self, clip_id: u32, volume: f32) -> Result<u32, JsValue> {
        self.inner
            .play_background_track(clip_id, volume)
            .map_err(to_js_error)
    }

    pub fn stop(&mut self, voice_id: u32) -> bool {
        self.inner.stop(voice_id)
    }

    pub fn stop_background(&mut self) {
        self.inner.stop_background_track();
    }

    pub fn clear_all(&mut self) {
        self.inner.clear_all();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Per-frame Update
    // ─────────────────────────────────────────────────────────────────────────

    /// Advance by `dt` seconds. Returns the ids of voices that finished.
    pub fn tick(&mut self, dt: f64) -> Vec<u32> {
        self.inner.tick(dt).to_vec()
    }

    /// Advance by rendered frames (AudioWorklet block size, usually 128).
    pub fn tick_frames(&mut self, frames: u32) -> Vec<u32> {
        self.inner.tick_frames(frames as usize).to_vec()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Levels & Readback
    // ─────────────────────────────────────────────────────────────────────────

    /// Set a bus level (0 master, 1 music, 2 effects) from a normalized level.
    pub fn set_bus_volume(&mut self, bus: u32, level: f32) {
        match Bus::from_index(bus) {
            Some(bus) => self.inner.set_bus_volume(bus, level),
            None => log::error!("set_bus_volume: unknown bus index {}", bus),
        }
    }

    /// Last level set on a bus in decibels, if any.
    pub fn bus_level_db(&self, bus: u32) -> Option<f32> {
        Bus::from_index(bus).and_then(|bus| self.inner.bus_level_db(bus))
    }

    pub fn active_voices(&self) -> Vec<u32> {
        self.inner.active_voice_ids()
    }

    pub fn voice_state(&self, voice_id: u32) -> Option<WebVoiceState> {
        self.inner.voice_state(voice_id).map(WebVoiceState::from)
    }
}
