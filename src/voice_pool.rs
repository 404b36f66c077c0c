// src/voice_pool.rs

use log::{debug, info, warn};

use crate::bus::{Bus, BusRouting, Mixer, level_to_db};
use crate::channel::{ChannelFactory, OutputChannel};
use crate::clip::Clip;
use crate::clock::FrameClock;
use crate::config::PoolConfig;
use crate::error::{PlayError, PlayResult};
use crate::voice::{PlaybackParams, Voice, VoiceId};

/// What happened to a voice handed back to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reclaimed {
    /// Returned to the idle stack.
    Pooled,
    /// Idle stack already full; the channel was destroyed.
    Discarded,
}

/// Recycles a bounded set of voices plus one background-music voice.
///
/// Responsibilities:
/// - hand out idle voices, most recently returned first
/// - create voices on demand (unbounded with `auto_grow`, up to capacity without)
/// - expire finished non-looping voices once per tick
/// - keep at most `capacity` idle voices, destroying the rest
///
/// Does NOT:
/// - mix, decode or load clips
/// - lock; every call comes from the host's frame loop
pub struct VoicePool<F: ChannelFactory> {
    factory: F,

    /// Idle voices. Used as a stack.
    available: Vec<Voice<F::Channel>>,

    /// Playing voices, in acquisition order.
    active: Vec<Voice<F::Channel>>,

    /// Background track voice. Never pooled.
    music: Option<Voice<F::Channel>>,

    capacity: usize,
    auto_grow: bool,
    master_volume: f32,

    routing: BusRouting,
    mixer: Option<Box<dyn Mixer>>,

    next_id: VoiceId,

    /// Scratch buffer for voices expired by the last `tick`.
    expired: Vec<VoiceId>,
}

impl<F: ChannelFactory> VoicePool<F> {
    pub fn new(config: PoolConfig, factory: F) -> Self {
        let mut pool = Self {
            factory,
            available: Vec::with_capacity(config.capacity),
            active: Vec::with_capacity(config.capacity),
            music: None,
            capacity: config.capacity,
            auto_grow: config.auto_grow,
            master_volume: config.initial_volume,
            routing: config.buses,
            mixer: None,
            next_id: 0,
            expired: Vec::with_capacity(config.capacity),
        };

        if config.prewarm {
            pool.prewarm();
        }

        pool
    }

    /// Attach the host mixer. Every retained voice, including prewarmed
    /// ones, is routed to its bus target; bus levels are forwarded to it.
    pub fn with_mixer(mut self, mixer: impl Mixer + 'static) -> Self {
        self.set_mixer(Some(Box::new(mixer)));
        self
    }

    pub fn set_mixer(&mut self, mixer: Option<Box<dyn Mixer>>) {
        self.mixer = mixer;
        self.route_existing();
    }

    // -------------------------------
    // MARK: Playback
    // -------------------------------

    /// Play a looping background track on the dedicated music voice.
    ///
    /// The music voice is created on first use and reused afterwards; a new
    /// call replaces the clip on it.
    pub fn play_background_track(
        &mut self,
        clip: Option<&Clip>,
        volume: f32,
    ) -> PlayResult<VoiceId> {
        let Some(clip) = clip else {
            warn!("play_background_track: clip is absent, ignoring request");
            return Err(PlayError::InvalidClip);
        };

        let music = match self.music.take() {
            Some(voice) => voice,
            None => self.create_voice(Bus::Music),
        };
        let music = self.music.insert(music);

        let params = PlaybackParams::new()
            .volume(volume * self.master_volume)
            .looping(true);
        music.play(clip, params);

        debug!(
            "Background track '{}' on voice {}",
            clip.name(),
            music.id()
        );
        Ok(music.id())
    }

    /// Play a clip on a pooled voice.
    ///
    /// Returns the voice id, or an error with no voice consumed.
    pub fn play_sound(&mut self, clip: Option<&Clip>, params: PlaybackParams) -> PlayResult<VoiceId> {
        let Some(clip) = clip else {
            warn!("play_sound: clip is absent, ignoring request");
            return Err(PlayError::InvalidClip);
        };

        let mut voice = self.acquire()?;
        voice.play(clip, params.volume(params.volume * self.master_volume));

        let id = voice.id();
        self.active.push(voice);
        Ok(id)
    }

    /// Stop a voice.
    ///
    /// An active voice is halted and reclaimed. The music voice is halted
    /// but kept. Returns false if `id` is neither.
    pub fn stop(&mut self, id: VoiceId) -> bool {
        if let Some(music) = self.music.as_mut().filter(|m| m.id() == id) {
            music.stop();
            return true;
        }

        self.reclaim(id).is_some()
    }

    /// Halt the background track without releasing its voice.
    pub fn stop_background_track(&mut self) {
        if let Some(music) = self.music.as_mut() {
            music.stop();
        }
    }

    /// Return an active voice to the pool, silencing it if still playing.
    ///
    /// The music voice and voices that are not active are left alone
    /// (returns `None`).
    pub fn reclaim(&mut self, id: VoiceId) -> Option<Reclaimed> {
        if self.is_music(id) {
            debug!("reclaim: voice {} is the background voice, ignoring", id);
            return None;
        }

        let index = self.active.iter().position(|v| v.id() == id)?;
        let mut voice = self.active.remove(index);
        voice.stop();

        Some(self.release(voice))
    }

    /// Silence everything while keeping every channel alive.
    ///
    /// The music voice stays reserved; all active voices become idle.
    pub fn clear_all(&mut self) {
        if let Some(music) = self.music.as_mut() {
            music.stop();
        }

        while let Some(mut voice) = self.active.pop() {
            voice.stop();
            self.available.push(voice);
        }
    }

    // -------------------------------
    // MARK: Per-frame update
    // -------------------------------

    /// Advance playback time by `dt` seconds and reclaim finished voices.
    ///
    /// Called once per frame, before any new play requests of that frame.
    /// Returns the ids expired by this call (valid until the next call).
    pub fn tick(&mut self, dt: f64) -> &[VoiceId] {
        self.expired.clear();

        // Reverse order: removing index `i` leaves `0..i` untouched.
        for i in (0..self.active.len()).rev() {
            if !self.active[i].advance(dt) {
                continue;
            }

            let mut voice = self.active.remove(i);
            voice.stop();

            let id = voice.id();
            let outcome = self.release(voice);
            debug!("Voice {} finished ({:?})", id, outcome);

            self.expired.push(id);
        }

        &self.expired
    }

    /// Tick from an audio callback that rendered `frames` frames.
    pub fn tick_frames(&mut self, clock: &mut FrameClock, frames: usize) -> &[VoiceId] {
        let dt = clock.advance_samples(frames);
        self.tick(dt)
    }

    // -------------------------------
    // MARK: Configuration
    // -------------------------------

    /// Set a bus level from a normalized `level` in `[0, 1]`.
    ///
    /// Dropped when no mixer is attached or the bus is unrouted.
    pub fn set_bus_volume(&mut self, bus: Bus, level: f32) {
        let db = level_to_db(level);

        let Some(mixer) = self.mixer.as_mut() else {
            debug!("set_bus_volume: no mixer attached, {} level dropped", bus);
            return;
        };

        let Some(target) = self.routing.resolve(bus) else {
            debug!("set_bus_volume: bus {} is unrouted", bus);
            return;
        };

        mixer.set_level_db(target, db);
    }

    /// Change the number of voices the pool retains.
    ///
    /// Playing voices are never interrupted: surplus active voices are
    /// destroyed as they are reclaimed. Surplus idle voices go right away.
    pub fn set_capacity(&mut self, capacity: usize) {
        info!("Voice pool capacity {} -> {}", self.capacity, capacity);
        self.capacity = capacity;

        if self.available.len() > capacity {
            // Bottom of the stack is the coldest.
            let surplus = self.available.len() - capacity;
            for voice in self.available.drain(..surplus) {
                self.factory.destroy(voice.into_channel());
            }
        }
    }

    pub fn set_auto_grow(&mut self, auto_grow: bool) {
        self.auto_grow = auto_grow;
    }

    /// Pool-wide gain. Applies to plays started after the change.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume;
    }

    /// Fill the idle stack until the pool retains `capacity` voices.
    ///
    /// Returns the number of voices created.
    pub fn prewarm(&mut self) -> usize {
        let mut created = 0;
        while self.retained() < self.capacity {
            let voice = self.create_voice(Bus::Effects);
            self.available.push(voice);
            created += 1;
        }

        debug!("Prewarmed {} voices", created);
        created
    }

    // -------------------------------
    // MARK: Queries
    // -------------------------------

    /// Find a voice by id among active, idle and background voices.
    pub fn voice(&self, id: VoiceId) -> Option<&Voice<F::Channel>> {
        self.active
            .iter()
            .chain(self.available.iter())
            .chain(self.music.iter())
            .find(|v| v.id() == id)
    }

    pub fn is_active(&self, id: VoiceId) -> bool {
        self.active.iter().any(|v| v.id() == id)
    }

    pub fn is_available(&self, id: VoiceId) -> bool {
        self.available.iter().any(|v| v.id() == id)
    }

    pub fn is_music(&self, id: VoiceId) -> bool {
        self.music.as_ref().is_some_and(|m| m.id() == id)
    }

    /// Iterate over playing voices.
    pub fn active_voices(&self) -> impl Iterator<Item = &Voice<F::Channel>> + '_ {
        self.active.iter()
    }

    /// Iterate over idle voices, bottom of the stack first.
    pub fn available_voices(&self) -> impl Iterator<Item = &Voice<F::Channel>> + '_ {
        self.available.iter()
    }

    pub fn music_voice(&self) -> Option<&Voice<F::Channel>> {
        self.music.as_ref()
    }

    /// Number of currently playing pooled voices.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of idle voices.
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn auto_grow(&self) -> bool {
        self.auto_grow
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn routing(&self) -> &BusRouting {
        &self.routing
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    // -------------------------------
    // MARK: Internals
    // -------------------------------

    /// Voices retained outside the music slot.
    #[inline]
    fn retained(&self) -> usize {
        self.available.len() + self.active.len()
    }

    fn acquire(&mut self) -> PlayResult<Voice<F::Channel>> {
        if let Some(voice) = self.available.pop() {
            return Ok(voice);
        }

        if self.auto_grow || self.retained() < self.capacity {
            return Ok(self.create_voice(Bus::Effects));
        }

        debug!(
            "Voice pool exhausted ({} active, capacity {})",
            self.active.len(),
            self.capacity
        );
        Err(PlayError::PoolExhausted {
            active: self.active.len(),
            capacity: self.capacity,
        })
    }

    /// Route voices created before the mixer was attached.
    fn route_existing(&mut self) {
        if self.mixer.is_none() {
            return;
        }

        let routing = &self.routing;
        let voices = self
            .active
            .iter_mut()
            .chain(self.available.iter_mut())
            .chain(self.music.iter_mut());

        let mut routed = 0;
        for voice in voices {
            if let Some(target) = routing.resolve(voice.bus()) {
                voice.channel_mut().route_to(target);
                routed += 1;
            }
        }

        debug!("Routed {} existing voices to the mixer", routed);
    }

    fn create_voice(&mut self, bus: Bus) -> Voice<F::Channel> {
        let mut channel = self.factory.create(bus);

        if self.mixer.is_some() {
            if let Some(target) = self.routing.resolve(bus) {
                channel.route_to(target);
            }
        }

        let id = self.next_id;
        self.next_id += 1;

        debug!("Created voice {} on bus {}", id, bus);
        Voice::new(id, bus, channel)
    }

    fn release(&mut self, voice: Voice<F::Channel>) -> Reclaimed {
        if self.available.len() >= self.capacity {
            debug!("Discarding voice {} (capacity {})", voice.id(), self.capacity);
            self.factory.destroy(voice.into_channel());
            return Reclaimed::Discarded;
        }

        self.available.push(voice);
        Reclaimed::Pooled
    }
}

impl<F: ChannelFactory> Drop for VoicePool<F> {
    fn drop(&mut self) {
        for voice in self.active.drain(..) {
            self.factory.destroy(voice.into_channel());
        }
        for voice in self.available.drain(..) {
            self.factory.destroy(voice.into_channel());
        }
        if let Some(music) = self.music.take() {
            self.factory.destroy(music.into_channel());
        }
    }
}
