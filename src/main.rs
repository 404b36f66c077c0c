// src/main.rs

use std::process::ExitCode;

use log::{error, info, warn};
use tracing_subscriber::EnvFilter;

use voicepool::{
    Bus, Clip, FrameClock, PlaybackParams, PoolConfig, VirtualChannelFactory, VirtualMixer,
    VoicePool,
};

/// ===============================
/// Main
/// ===============================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match PoolConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => PoolConfig::default(),
    };

    let sample_rate = 48_000.0;
    let block_frames = 1024;

    // --------------------------------
    // Pool
    // --------------------------------

    let mut pool =
        VoicePool::new(config, VirtualChannelFactory::new()).with_mixer(VirtualMixer::new());
    let mut clock = FrameClock::new(sample_rate);

    pool.set_bus_volume(Bus::Master, 1.0);
    pool.set_bus_volume(Bus::Music, 0.7);
    pool.set_bus_volume(Bus::Effects, 0.9);

    // --------------------------------
    // Clips
    // --------------------------------

    let theme = Clip::new(0, "theme", 95.0);
    let laser = Clip::new(1, "laser", 0.25);
    let explosion = Clip::new(2, "explosion", 1.2);
    let engine_hum = Clip::new(3, "engine_hum", 2.0);

    if let Err(e) = pool.play_background_track(Some(&theme), 0.8) {
        warn!("Background track not started: {}", e);
    }

    if let Err(e) = pool.play_sound(Some(&engine_hum), PlaybackParams::new().looping(true)) {
        warn!("Engine hum not started: {}", e);
    }

    // An absent clip is reported and ignored.
    if let Err(e) = pool.play_sound(None, PlaybackParams::new()) {
        info!("Absent clip rejected: {}", e);
    }

    // --------------------------------
    // Run a few frames
    // --------------------------------

    info!("Starting voice pool sanity run…");

    for frame in 0..64 {
        let expired = pool.tick_frames(&mut clock, block_frames).len();
        if expired > 0 {
            info!("Frame {}: {} voice(s) finished", frame, expired);
        }

        if frame % 4 == 0 {
            let pan = (frame as f32 / 32.0) - 1.0;
            if let Err(e) = pool.play_sound(Some(&laser), PlaybackParams::new().pan(pan)) {
                warn!("Laser dropped: {}", e);
            }
        }

        if frame % 16 == 0 {
            if let Err(e) = pool.play_sound(Some(&explosion), PlaybackParams::new().volume(0.6)) {
                warn!("Explosion dropped: {}", e);
            }
        }
    }

    info!(
        "{:.2}s simulated: {} active, {} idle, {} channels created, {} destroyed",
        clock.seconds(),
        pool.active_count(),
        pool.available_count(),
        pool.factory().created(),
        pool.factory().destroyed().len()
    );

    pool.clear_all();
    info!(
        "After clear: {} active, {} idle",
        pool.active_count(),
        pool.available_count()
    );

    info!("Sanity run completed.");
    ExitCode::SUCCESS
}
