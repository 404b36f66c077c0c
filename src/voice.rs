// src/voice.rs

use crate::bus::Bus;
use crate::channel::OutputChannel;
use crate::clip::Clip;

/// Stable identity of a voice. Assigned once by the pool, never reused.
pub type VoiceId = u32;

/// Per-play arguments besides the clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParams {
    pub volume: f32,
    pub pitch: f32,
    pub pan: f32,
    pub looping: bool,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 1.0,
            pan: 0.0,
            looping: false,
        }
    }
}

impl PlaybackParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn pan(mut self, pan: f32) -> Self {
        self.pan = pan;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

/// A voice is one reusable playback handle bound to one output channel.
///
/// Voices do NOT know their pool.
/// Returning a finished voice is the pool's job (`VoicePool::stop`, `tick`).
#[derive(Debug)]
pub struct Voice<C: OutputChannel> {
    id: VoiceId,
    bus: Bus,
    channel: C,
    clip: Option<Clip>,
    /// Seconds since the last `play`.
    elapsed: f64,
    looping: bool,
}

impl<C: OutputChannel> Voice<C> {
    #[inline]
    pub fn new(id: VoiceId, bus: Bus, channel: C) -> Self {
        Self {
            id,
            bus,
            channel,
            clip: None,
            elapsed: 0.0,
            looping: false,
        }
    }

    /// Start `clip` on this voice, replacing whatever was playing.
    pub fn play(&mut self, clip: &Clip, params: PlaybackParams) {
        self.elapsed = 0.0;
        self.looping = params.looping;
        self.clip = Some(clip.clone());

        self.channel.set_clip(Some(clip));
        self.channel.set_volume(params.volume);
        self.channel.set_pitch(params.pitch);
        self.channel.set_pan(params.pan);
        self.channel.set_looping(params.looping);
        self.channel.play();
    }

    /// Halt output and drop the clip reference.
    pub fn stop(&mut self) {
        self.channel.stop();
        self.channel.set_clip(None);
        self.clip = None;
    }

    /// Accumulate `dt` seconds of playback.
    ///
    /// Returns true once a non-looping voice has played its whole clip.
    /// Looping voices never finish and do not accumulate time.
    pub fn advance(&mut self, dt: f64) -> bool {
        if self.looping {
            return false;
        }

        self.elapsed += dt;

        match &self.clip {
            Some(clip) => self.elapsed >= clip.duration(),
            None => true,
        }
    }

    #[inline]
    pub fn id(&self) -> VoiceId {
        self.id
    }

    #[inline]
    pub fn bus(&self) -> Bus {
        self.bus
    }

    #[inline]
    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub(crate) fn into_channel(self) -> C {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::VirtualChannel;

    fn voice() -> Voice<VirtualChannel> {
        Voice::new(0, Bus::Effects, VirtualChannel::new(0, Bus::Effects))
    }

    #[test]
    fn test_play_configures_channel() {
        let mut v = voice();
        let clip = Clip::new(3, "coin", 0.4);
        v.play(&clip, PlaybackParams::new().volume(0.5).pitch(1.2).pan(-0.3));

        let ch = v.channel();
        assert!(ch.is_playing());
        assert_eq!(ch.clip().map(Clip::id), Some(3));
        assert_eq!(ch.volume(), 0.5);
        assert_eq!(ch.pitch(), 1.2);
        assert_eq!(ch.pan(), -0.3);
        assert!(!ch.looping());
    }

    #[test]
    fn test_play_resets_elapsed_and_looping() {
        let mut v = voice();
        let long = Clip::new(1, "long", 10.0);
        v.play(&long, PlaybackParams::new());
        v.advance(4.0);
        assert_eq!(v.elapsed(), 4.0);

        v.play(&long, PlaybackParams::new().looping(true));
        assert_eq!(v.elapsed(), 0.0);
        assert!(v.is_looping());

        v.play(&long, PlaybackParams::new());
        assert!(!v.is_looping());
    }

    #[test]
    fn test_advance_finishes_at_duration() {
        let mut v = voice();
        v.play(&Clip::new(1, "two", 2.0), PlaybackParams::new());

        assert!(!v.advance(1.0));
        assert!(v.advance(1.0));
    }

    #[test]
    fn test_looping_never_finishes() {
        let mut v = voice();
        v.play(&Clip::new(1, "ambience", 1.0), PlaybackParams::new().looping(true));

        for _ in 0..100 {
            assert!(!v.advance(1000.0));
        }
        assert_eq!(v.elapsed(), 0.0);
    }

    #[test]
    fn test_stop_clears_clip() {
        let mut v = voice();
        v.play(&Clip::new(1, "x", 1.0), PlaybackParams::new());
        v.stop();

        assert!(v.clip().is_none());
        assert!(!v.channel().is_playing());
        assert!(v.channel().clip().is_none());
    }
}
