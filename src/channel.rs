// src/channel.rs
//
// Output channels: the host-side objects that actually produce sound.
//
// The pool creates and destroys channels only through a `ChannelFactory`,
// so the cost of touching the host audio system is confined to growth and
// capacity trimming.

use crate::bus::Bus;
use crate::clip::Clip;

/// One playback-capable output of the host audio system.
pub trait OutputChannel {
    /// Assign or clear the clip. `None` drops the reference.
    fn set_clip(&mut self, clip: Option<&Clip>);

    fn set_volume(&mut self, volume: f32);

    fn set_pitch(&mut self, pitch: f32);

    /// Stereo pan, -1 (left) to 1 (right).
    fn set_pan(&mut self, pan: f32);

    fn set_looping(&mut self, looping: bool);

    /// Route output to a mixer target. Called once, right after creation,
    /// and only when a mixer is attached and the bus is routed.
    fn route_to(&mut self, target: &str);

    fn play(&mut self);

    fn stop(&mut self);

    fn is_playing(&self) -> bool;
}

/// Creates and destroys output channels on behalf of the pool.
pub trait ChannelFactory {
    type Channel: OutputChannel;

    /// Create one channel for the given bus.
    fn create(&mut self, bus: Bus) -> Self::Channel;

    /// Release a channel the pool no longer retains.
    fn destroy(&mut self, channel: Self::Channel);
}

/// Convenience factory for channels that need no explicit teardown.
pub struct SimpleChannelFactory<F> {
    create_fn: F,
}

impl<F> SimpleChannelFactory<F> {
    pub fn new(create_fn: F) -> Self {
        Self { create_fn }
    }
}

impl<C, F> ChannelFactory for SimpleChannelFactory<F>
where
    C: OutputChannel,
    F: FnMut(Bus) -> C,
{
    type Channel = C;

    fn create(&mut self, bus: Bus) -> C {
        (self.create_fn)(bus)
    }

    fn destroy(&mut self, channel: C) {
        drop(channel);
    }
}

/// Channel that keeps its state in memory instead of driving hardware.
///
/// Hosts that poll voice state each frame (the C and web bindings) read it
/// from here and mirror it onto their own audio sources.
#[derive(Debug, Clone)]
pub struct VirtualChannel {
    id: u32,
    bus: Bus,
    clip: Option<Clip>,
    volume: f32,
    pitch: f32,
    pan: f32,
    looping: bool,
    route: Option<String>,
    playing: bool,
}

impl VirtualChannel {
    pub fn new(id: u32, bus: Bus) -> Self {
        Self {
            id,
            bus,
            clip: None,
            volume: 1.0,
            pitch: 1.0,
            pan: 0.0,
            looping: false,
            route: None,
            playing: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bus(&self) -> Bus {
        self.bus
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }
}

impl OutputChannel for VirtualChannel {
    fn set_clip(&mut self, clip: Option<&Clip>) {
        self.clip = clip.cloned();
        if self.clip.is_none() {
            self.playing = false;
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    fn set_pan(&mut self, pan: f32) {
        self.pan = pan;
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn route_to(&mut self, target: &str) {
        self.route = Some(target.to_owned());
    }

    fn play(&mut self) {
        self.playing = self.clip.is_some();
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Factory for `VirtualChannel`s that keeps track of channel churn.
#[derive(Debug, Default)]
pub struct VirtualChannelFactory {
    next_id: u32,
    destroyed: Vec<u32>,
}

impl VirtualChannelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of channels created so far.
    pub fn created(&self) -> usize {
        self.next_id as usize
    }

    /// Ids of destroyed channels, in destruction order.
    pub fn destroyed(&self) -> &[u32] {
        &self.destroyed
    }
}

impl ChannelFactory for VirtualChannelFactory {
    type Channel = VirtualChannel;

    fn create(&mut self, bus: Bus) -> VirtualChannel {
        let channel = VirtualChannel::new(self.next_id, bus);
        self.next_id += 1;
        channel
    }

    fn destroy(&mut self, channel: VirtualChannel) {
        self.destroyed.push(channel.id);
    }
}
