// C-compatible FFI bindings for Swift/iOS integration.
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - String parameters must be valid UTF-8 (Swift strings are always valid)
// - Caller must call `voicepool_destroy` for each `voicepool_create*`
//
// The host owns the real audio sources. Each frame it calls `voicepool_tick`
// and mirrors `voicepool_voice_state` onto its sources.

use std::ffi::{CStr, c_char};

use crate::bus::Bus;
use crate::config::PoolConfig;
use crate::error::PlayError;
use crate::host::HostPool;
use crate::voice::PlaybackParams;

use log::{LevelFilter, debug, error, warn};
use oslog::OsLogger;

// Logger subsystem identifier
const LOG_SUBSYSTEM: &str = "com.voicepool";

/// Returned by play functions when the clip id is unknown.
pub const VOICEPOOL_INVALID_CLIP: i64 = -1;

/// Returned by play functions when no voice could be obtained.
pub const VOICEPOOL_POOL_EXHAUSTED: i64 = -2;

/// Returned when a handle argument is null.
pub const VOICEPOOL_NULL_HANDLE: i64 = -3;

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup, before any other FFI function. Pool
/// warnings (absent clips etc.) then appear in Console.app and Xcode.
#[unsafe(no_mangle)]
pub extern "C" fn voicepool_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle / Result Types
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to a voice pool.
pub struct VoicePoolHandle {
    inner: HostPool,
    /// Copy of the last tick's expired ids, readable after the call returns.
    expired: Vec<u32>,
}

/// Voice readback for the host's per-frame mirror pass.
#[repr(C)]
pub struct VoicePoolVoiceState {
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

fn play_result_code(result: Result<u32, PlayError>) -> i64 {
    match result {
        Ok(voice_id) => voice_id as i64,
        Err(PlayError::InvalidClip) => VOICEPOOL_INVALID_CLIP,
        Err(PlayError::PoolExhausted { .. }) => VOICEPOOL_POOL_EXHAUSTED,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Creation
// ═══════════════════════════════════════════════════════════════════════════

/// Create a pool with default configuration (8 voices, auto-grow).
///
/// A non-positive or non-finite `sample_rate` falls back to 48 kHz.
#[unsafe(no_mangle)]
pub extern "C" fn voicepool_create(sample_rate: f64) -> *mut VoicePoolHandle {
    Box::into_raw(Box::new(VoicePoolHandle {
        inner: HostPool::new(PoolConfig::default(), sample_rate),
        expired: Vec::new(),
    }))
}

/// Create a pool from a TOML configuration string.
///
/// Returns NULL if the configuration is invalid.
///
/// # Safety
/// `config_toml` must be a valid null-terminated UTF-8 string or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_create_with_config(
    config_toml: *const c_char,
    sample_rate: f64,
) -> *mut VoicePoolHandle {
    if config_toml.is_null() {
        return voicepool_create(sample_rate);
    }

    let Ok(source) = (unsafe { CStr::from_ptr(config_toml) }).to_str() else {
        error!("voicepool_create_with_config: config is not valid UTF-8");
        return std::ptr::null_mut();
    };

    match HostPool::from_toml(source, sample_rate) {
        Ok(inner) => Box::into_raw(Box::new(VoicePoolHandle {
            inner,
            expired: Vec::new(),
        })),
        Err(e) => {
            error!("voicepool_create_with_config: {}", e);
            std::ptr::null_mut()
        }
    }
}

/// Destroy a pool and every channel it holds.
///
/// # Safety
/// `pool` must be a valid pointer returned by `voicepool_create*`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_destroy(pool: *mut VoicePoolHandle) {
    if !pool.is_null() {
        unsafe { drop(Box::from_raw(pool)) };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Clips
// ═══════════════════════════════════════════════════════════════════════════

/// Register a clip by name and duration in seconds. Returns its id.
///
/// # Safety
/// `pool` must be valid. `name` must be a valid null-terminated UTF-8 string
/// or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_register_clip(
    pool: *mut VoicePoolHandle,
    name: *const c_char,
    duration: f64,
) -> i64 {
    if pool.is_null() {
        return VOICEPOOL_NULL_HANDLE;
    }

    let name = if name.is_null() {
        ""
    } else {
        match unsafe { CStr::from_ptr(name) }.to_str() {
            Ok(name) => name,
            Err(e) => {
                warn!(
                    "voicepool_register_clip: name is not valid UTF-8 ({}), registering unnamed",
                    e
                );
                ""
            }
        }
    };

    let clip_id = unsafe { (*pool).inner.register_clip(name, duration) };
    debug!("Registered clip '{}' as {}", name, clip_id);
    clip_id as i64
}

/// Forget a clip. Voices already playing it are unaffected.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_unregister_clip(pool: *mut VoicePoolHandle, clip_id: u32) -> bool {
    if pool.is_null() {
        return false;
    }
    unsafe { (*pool).inner.unregister_clip(clip_id) }
}

// ═══════════════════════════════════════════════════════════════════════════
// Playback
// ═══════════════════════════════════════════════════════════════════════════

/// Play a clip on a pooled voice.
///
/// Returns the voice id, or a negative `VOICEPOOL_*` code.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_play_sound(
    pool: *mut VoicePoolHandle,
    clip_id: u32,
    volume: f32,
    pitch: f32,
    pan: f32,
    looping: bool,
) -> i64 {
    if pool.is_null() {
        return VOICEPOOL_NULL_HANDLE;
    }

    let params = PlaybackParams::new()
        .volume(volume)
        .pitch(pitch)
        .pan(pan)
        .looping(looping);
    play_result_code(unsafe { (*pool).inner.play_sound(clip_id, params) })
}

/// Play a clip on the background music voice (always looping).
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_play_background(
    pool: *mut VoicePoolHandle,
    clip_id: u32,
    volume: f32,
) -> i64 {
    if pool.is_null() {
        return VOICEPOOL_NULL_HANDLE;
    }
    play_result_code(unsafe { (*pool).inner.play_background_track(clip_id, volume) })
}

/// Stop a voice. Pooled voices are reclaimed; the music voice is kept.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_stop(pool: *mut VoicePoolHandle, voice_id: u32) -> bool {
    if pool.is_null() {
        return false;
    }
    unsafe { (*pool).inner.stop(voice_id) }
}

/// Halt the background track.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_stop_background(pool: *mut VoicePoolHandle) {
    if pool.is_null() {
        return;
    }
    unsafe { (*pool).inner.stop_background_track() };
}

/// Silence every voice, keeping all channels.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_clear_all(pool: *mut VoicePoolHandle) {
    if pool.is_null() {
        return;
    }
    unsafe { (*pool).inner.clear_all() };
}

// ═══════════════════════════════════════════════════════════════════════════
// Per-frame Update
// ═══════════════════════════════════════════════════════════════════════════

/// Advance by `dt` seconds. Returns the number of voices that finished;
/// read their ids with `voicepool_expired`.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_tick(pool: *mut VoicePoolHandle, dt: f64) -> u32 {
    if pool.is_null() {
        return 0;
    }
    let handle = unsafe { &mut *pool };
    let expired = handle.inner.tick(dt);
    handle.expired.clear();
    handle.expired.extend_from_slice(expired);
    handle.expired.len() as u32
}

/// Advance by a number of rendered frames at the pool's sample rate.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_tick_frames(pool: *mut VoicePoolHandle, frames: u32) -> u32 {
    if pool.is_null() {
        return 0;
    }
    let handle = unsafe { &mut *pool };
    let expired = handle.inner.tick_frames(frames as usize);
    handle.expired.clear();
    handle.expired.extend_from_slice(expired);
    handle.expired.len() as u32
}

/// Copy the ids expired by the last tick into `out`.
///
/// Returns the number of ids written.
///
/// # Safety
/// `pool` must be valid. `out` must point to at least `capacity` u32s.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_expired(
    pool: *const VoicePoolHandle,
    out: *mut u32,
    capacity: u32,
) -> u32 {
    if pool.is_null() || out.is_null() {
        return 0;
    }
    let expired = unsafe { &(*pool).expired };
    let count = expired.len().min(capacity as usize);
    unsafe { std::ptr::copy_nonoverlapping(expired.as_ptr(), out, count) };
    count as u32
}

// ═══════════════════════════════════════════════════════════════════════════
// Levels
// ═══════════════════════════════════════════════════════════════════════════

/// Set a bus level (0 master, 1 music, 2 effects) from a normalized level.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_set_bus_volume(pool: *mut VoicePoolHandle, bus: u32, level: f32) {
    if pool.is_null() {
        return;
    }
    let Some(bus) = Bus::from_index(bus) else {
        error!("voicepool_set_bus_volume: unknown bus index {}", bus);
        return;
    };
    unsafe { (*pool).inner.set_bus_volume(bus, level) };
}

/// Last level set on a bus in decibels, or NaN if none.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_bus_level_db(pool: *const VoicePoolHandle, bus: u32) -> f32 {
    if pool.is_null() {
        return f32::NAN;
    }
    Bus::from_index(bus)
        .and_then(|bus| unsafe { (*pool).inner.bus_level_db(bus) })
        .unwrap_or(f32::NAN)
}

// ═══════════════════════════════════════════════════════════════════════════
// Readback
// ═══════════════════════════════════════════════════════════════════════════

/// Number of playing pooled voices.
///
/// # Safety
/// `pool` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_active_count(pool: *const VoicePoolHandle) -> u32 {
    if pool.is_null() {
        return 0;
    }
    unsafe { (*pool).inner.pool().active_count() as u32 }
}

/// Read one voice's state. Returns false if the voice does not exist.
///
/// # Safety
/// `pool` must be valid. `out` must point to writable memory.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn voicepool_voice_state(
    pool: *const VoicePoolHandle,
    voice_id: u32,
    out: *mut VoicePoolVoiceState,
) -> bool {
    if pool.is_null() || out.is_null() {
        return false;
    }

    let Some(state) = (unsafe { (*pool).inner.voice_state(voice_id) }) else {
        return false;
    };

    unsafe {
        *out = VoicePoolVoiceState {
            voice_id: state.voice_id,
            has_clip: state.clip_id.is_some(),
            clip_id: state.clip_id.unwrap_or(0),
            volume: state.volume,
            pitch: state.pitch,
            pan: state.pan,
            looping: state.looping,
            playing: state.playing,
            elapsed: state.elapsed,
            is_music: state.is_music,
        };
    }
    true
}

#[cfg(test)]
mod tests {
    use std::ffi::CString;

    use super::*;

    #[test]
    fn test_non_utf8_clip_name_registers_unnamed() {
        let pool = voicepool_create(48_000.0);
        let name = CString::new(vec![0xff, 0xfe, b'x']).unwrap();

        let clip_id = unsafe { voicepool_register_clip(pool, name.as_ptr(), 0.5) };
        assert!(clip_id >= 0);

        let clip = unsafe { (*pool).inner.clip(clip_id as u32) }.unwrap();
        assert_eq!(clip.name(), "");
        assert_eq!(clip.duration(), 0.5);

        unsafe { voicepool_destroy(pool) };
    }

    #[test]
    fn test_config_with_zero_rate_still_expires() {
        let config = CString::new("capacity = 2\nprewarm = true").unwrap();
        let pool = unsafe { voicepool_create_with_config(config.as_ptr(), 0.0) };
        assert!(!pool.is_null());

        let name = CString::new("blip").unwrap();
        let clip_id = unsafe { voicepool_register_clip(pool, name.as_ptr(), 0.5) };
        let voice = unsafe { voicepool_play_sound(pool, clip_id as u32, 1.0, 1.0, 0.0, false) };
        assert!(voice >= 0);

        assert_eq!(unsafe { voicepool_tick_frames(pool, 24_000) }, 1);
        assert_eq!(unsafe { voicepool_active_count(pool) }, 0);

        unsafe { voicepool_destroy(pool) };
    }
}
