// src/lib.rs
//
// Library entry point for Rust, FFI (iOS/Swift) and web consumers.

pub mod bus;
pub mod channel;
pub mod clip;
pub mod clock;
pub mod config;
pub mod error;
pub mod host;
pub mod voice;
pub mod voice_pool;

#[cfg(feature = "ios")]
pub mod ffi;

#[cfg(feature = "web")]
pub mod wasm;

// Re-export key types for Rust consumers
pub use bus::{Bus, BusRouting, Mixer, VirtualMixer, level_to_db};
pub use channel::{ChannelFactory, OutputChannel, VirtualChannel, VirtualChannelFactory};
pub use clip::{Clip, ClipBank, ClipId};
pub use clock::FrameClock;
pub use config::PoolConfig;
pub use error::{ConfigError, PlayError, PlayResult};
pub use host::{HostPool, VoiceState};
pub use voice::{PlaybackParams, Voice, VoiceId};
pub use voice_pool::{Reclaimed, VoicePool};
