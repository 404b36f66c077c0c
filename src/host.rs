// src/host.rs
//
// Polling host adapter.
//
// Hosts behind the C and web bindings cannot hand us native channel objects.
// Instead they drive a pool of virtual channels, refer to clips by id, and
// read back each voice's state once per frame to mirror it onto their own
// audio sources. Both binding layers wrap this type.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bus::{Bus, VirtualMixer};
use crate::channel::{OutputChannel, VirtualChannelFactory};
use crate::clip::{Clip, ClipBank, ClipId};
use crate::clock::FrameClock;
use crate::config::PoolConfig;
use crate::error::{ConfigError, PlayResult};
use crate::voice::{PlaybackParams, VoiceId};
use crate::voice_pool::VoicePool;

/// Snapshot of one voice, as a polling host needs it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceState {
    pub voice_id: VoiceId,
    pub clip_id: Option<ClipId>,
    pub volume: f32,
    pub pitch: f32,
    pub pan: f32,
    pub looping: bool,
    pub playing: bool,
    pub elapsed: f64,
    pub is_music: bool,
}

/// Voice pool plus everything a polling host needs around it.
pub struct HostPool {
    pool: VoicePool<VirtualChannelFactory>,
    clips: ClipBank,
    mixer: Rc<RefCell<VirtualMixer>>,
    clock: FrameClock,
}

impl HostPool {
    pub fn new(config: PoolConfig, sample_rate: f64) -> Self {
        let mixer = Rc::new(RefCell::new(VirtualMixer::new()));
        let pool = VoicePool::new(config, VirtualChannelFactory::new()).with_mixer(mixer.clone());

        Self {
            pool,
            clips: ClipBank::new(),
            mixer,
            clock: FrameClock::new(sample_rate),
        }
    }

    /// Build from a TOML configuration document.
    pub fn from_toml(source: &str, sample_rate: f64) -> Result<Self, ConfigError> {
        let config = PoolConfig::from_toml_str(source)?;
        Ok(Self::new(config, sample_rate))
    }

    // -------------------------------
    // MARK: Clips
    // -------------------------------

    pub fn register_clip(&mut self, name: &str, duration: f64) -> ClipId {
        self.clips.register(name, duration)
    }

    pub fn unregister_clip(&mut self, clip_id: ClipId) -> bool {
        self.clips.unregister(clip_id).is_some()
    }

    pub fn clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.clips.get(clip_id)
    }

    // -------------------------------
    // MARK: Playback
    // -------------------------------

    /// Unknown clip ids are treated as an absent clip.
    pub fn play_sound(&mut self, clip_id: ClipId, params: PlaybackParams) -> PlayResult<VoiceId> {
        self.pool.play_sound(self.clips.get(clip_id), params)
    }

    pub fn play_background_track(&mut self, clip_id: ClipId, volume: f32) -> PlayResult<VoiceId> {
        self.pool.play_background_track(self.clips.get(clip_id), volume)
    }

    pub fn stop(&mut self, voice_id: VoiceId) -> bool {
        self.pool.stop(voice_id)
    }

    pub fn stop_background_track(&mut self) {
        self.pool.stop_background_track();
    }

    pub fn clear_all(&mut self) {
        self.pool.clear_all();
    }

    pub fn tick(&mut self, dt: f64) -> &[VoiceId] {
        self.pool.tick(dt)
    }

    /// Tick by a number of rendered frames at the host sample rate.
    pub fn tick_frames(&mut self, frames: usize) -> &[VoiceId] {
        self.pool.tick_frames(&mut self.clock, frames)
    }

    // -------------------------------
    // MARK: Levels
    // -------------------------------

    pub fn set_bus_volume(&mut self, bus: Bus, level: f32) {
        self.pool.set_bus_volume(bus, level);
    }

    /// Last level set on `bus`, in decibels. `None` if never set or unrouted.
    pub fn bus_level_db(&self, bus: Bus) -> Option<f32> {
        let target = self.pool.routing().resolve(bus)?;
        self.mixer.borrow().level_db(target)
    }

    // -------------------------------
    // MARK: Readback
    // -------------------------------

    pub fn voice_state(&self, voice_id: VoiceId) -> Option<VoiceState> {
        let voice = self.pool.voice(voice_id)?;
        let channel = voice.channel();

        Some(VoiceState {
            voice_id,
            clip_id: channel.clip().map(Clip::id),
            volume: channel.volume(),
            pitch: channel.pitch(),
            pan: channel.pan(),
            looping: channel.looping(),
            playing: channel.is_playing(),
            elapsed: voice.elapsed(),
            is_music: self.pool.is_music(voice_id),
        })
    }

    /// Ids of all playing pooled voices.
    pub fn active_voice_ids(&self) -> Vec<VoiceId> {
        self.pool.active_voices().map(|v| v.id()).collect()
    }

    pub fn pool(&self) -> &VoicePool<VirtualChannelFactory> {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut VoicePool<VirtualChannelFactory> {
        &mut self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayError;

    #[test]
    fn test_unknown_clip_is_invalid() {
        let mut host = HostPool::new(PoolConfig::default(), 48_000.0);
        assert_eq!(
            host.play_sound(12, PlaybackParams::new()),
            Err(PlayError::InvalidClip)
        );
        assert_eq!(host.pool().active_count(), 0);
    }

    #[test]
    fn test_voice_state_readback() {
        let mut host = HostPool::new(PoolConfig::default(), 48_000.0);
        let clip = host.register_clip("jump", 1.0);
        let id = host
            .play_sound(clip, PlaybackParams::new().pitch(1.5).pan(0.25))
            .unwrap();

        host.tick_frames(12_000);
        let state = host.voice_state(id).unwrap();
        assert_eq!(state.clip_id, Some(clip));
        assert_eq!(state.pitch, 1.5);
        assert_eq!(state.pan, 0.25);
        assert_eq!(state.elapsed, 0.25);
        assert!(state.playing);
        assert!(!state.is_music);

        assert_eq!(host.tick_frames(36_000), &[id]);
        let state = host.voice_state(id).unwrap();
        assert!(!state.playing);
        assert_eq!(state.clip_id, None);
    }

    #[test]
    fn test_bus_levels_reach_mixer() {
        let mut host = HostPool::new(PoolConfig::default(), 48_000.0);
        assert_eq!(host.bus_level_db(Bus::Effects), None);

        host.set_bus_volume(Bus::Effects, 0.0);
        let db = host.bus_level_db(Bus::Effects).unwrap();
        assert!((db + 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_from_toml() {
        let host = HostPool::from_toml("capacity = 2\nprewarm = true", 44_100.0).unwrap();
        assert_eq!(host.pool().available_count(), 2);

        assert!(HostPool::from_toml("capacity = -1", 44_100.0).is_err());
    }

    #[test]
    fn test_prewarmed_voices_are_routed() {
        let mut host = HostPool::from_toml("capacity = 2\nprewarm = true", 48_000.0).unwrap();
        let clip = host.register_clip("step", 0.5);
        let id = host.play_sound(clip, PlaybackParams::new()).unwrap();

        let voice = host.pool().voice(id).unwrap();
        assert_eq!(voice.channel().route(), Some("Effects"));
    }

    #[test]
    fn test_zero_sample_rate_still_expires_voices() {
        let mut host = HostPool::from_toml("", 0.0).unwrap();
        let clip = host.register_clip("blip", 0.5);
        let id = host.play_sound(clip, PlaybackParams::new()).unwrap();

        assert!(host.tick_frames(0).is_empty());
        assert_eq!(host.voice_state(id).unwrap().elapsed, 0.0);
        assert_eq!(host.tick_frames(24_000), &[id]);
        assert!(host.active_voice_ids().is_empty());
    }
}
