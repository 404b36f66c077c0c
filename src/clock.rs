// src/clock.rs

use log::warn;

/// Rate used when the host reports an unusable one.
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

//
// ===============================
// MARK: Host frame clock
// ===============================
//

/// Sample-domain clock for hosts that tick from an audio callback.
///
/// The pool measures playback in seconds. Hosts that only know how many
/// frames they rendered advance this clock and feed the returned delta to
/// `VoicePool::tick`.
#[derive(Debug, Copy, Clone)]
pub struct FrameClock {
    /// Absolute sample position
    sample_pos: u64,

    /// Sample rate (Hz)
    sample_rate: f64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl FrameClock {
    /// Non-positive or non-finite rates fall back to `DEFAULT_SAMPLE_RATE`.
    pub fn new(sample_rate: f64) -> Self {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            warn!(
                "Invalid sample rate {}, using {} Hz",
                sample_rate, DEFAULT_SAMPLE_RATE
            );
            DEFAULT_SAMPLE_RATE
        };

        Self {
            sample_pos: 0,
            sample_rate,
        }
    }

    /// Advance by a number of frames. Returns the elapsed seconds.
    pub fn advance_samples(&mut self, frames: usize) -> f64 {
        self.sample_pos += frames as u64;
        frames as f64 / self.sample_rate
    }

    /// Absolute time in seconds.
    #[inline]
    pub fn seconds(&self) -> f64 {
        self.sample_pos as f64 / self.sample_rate
    }

    #[inline]
    pub fn sample_position(&self) -> u64 {
        self.sample_pos
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_returns_delta_seconds() {
        let mut clock = FrameClock::new(48_000.0);
        assert_eq!(clock.advance_samples(24_000), 0.5);
        assert_eq!(clock.advance_samples(48_000), 1.0);
        assert_eq!(clock.sample_position(), 72_000);
        assert_eq!(clock.seconds(), 1.5);
    }

    #[test]
    fn test_unusable_rate_falls_back_to_default() {
        for rate in [0.0, -44_100.0, f64::NAN, f64::INFINITY] {
            let mut clock = FrameClock::new(rate);
            assert_eq!(clock.sample_rate(), DEFAULT_SAMPLE_RATE);
            assert_eq!(clock.advance_samples(0), 0.0);
            assert_eq!(clock.advance_samples(24_000), 0.5);
        }
    }
}
