// src/bus.rs
//
// Output buses and mixer levels.
//
// A bus is a named routing group in the host mixer. The pool only knows the
// three closed variants below; which mixer group each one lands on comes from
// configuration, so hosts with differently named groups need no code change.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Quietest level a bus can be set to, in decibels.
pub const MIN_BUS_DB: f32 = -80.0;

/// Loudest level a bus can be set to, in decibels.
pub const MAX_BUS_DB: f32 = 0.0;

/// Output bus a voice or a level change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bus {
    Master,
    Music,
    Effects,
}

impl Bus {
    pub const ALL: [Bus; 3] = [Bus::Master, Bus::Music, Bus::Effects];

    /// Bus for a host-side index (0 master, 1 music, 2 effects).
    pub fn from_index(index: u32) -> Option<Bus> {
        Self::ALL.get(index as usize).copied()
    }

    /// Default mixer target name for this bus.
    pub fn default_target(self) -> &'static str {
        match self {
            Bus::Master => "Master",
            Bus::Music => "Music",
            Bus::Effects => "Effects",
        }
    }
}

impl fmt::Display for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_target())
    }
}

/// Mapping from bus to mixer target name.
///
/// A bus without an entry is unrouted: channels created for it are left on
/// the host's default output and level changes for it are dropped. A
/// `[buses]` table that names only some buses leaves the others unrouted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusRouting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    master: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    music: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    effects: Option<String>,
}

impl BusRouting {
    /// Routing with no bus mapped.
    pub fn unrouted() -> Self {
        Self {
            master: None,
            music: None,
            effects: None,
        }
    }

    pub fn with_target(mut self, bus: Bus, target: impl Into<String>) -> Self {
        self.set_target(bus, Some(target.into()));
        self
    }

    pub fn set_target(&mut self, bus: Bus, target: Option<String>) {
        *self.slot_mut(bus) = target;
    }

    /// Mixer target for `bus`, if it is routed.
    pub fn resolve(&self, bus: Bus) -> Option<&str> {
        match bus {
            Bus::Master => self.master.as_deref(),
            Bus::Music => self.music.as_deref(),
            Bus::Effects => self.effects.as_deref(),
        }
    }

    fn slot_mut(&mut self, bus: Bus) -> &mut Option<String> {
        match bus {
            Bus::Master => &mut self.master,
            Bus::Music => &mut self.music,
            Bus::Effects => &mut self.effects,
        }
    }
}

impl Default for BusRouting {
    fn default() -> Self {
        Bus::ALL
            .iter()
            .fold(Self::unrouted(), |routing, &bus| {
                routing.with_target(bus, bus.default_target())
            })
    }
}

/// The host mixer the pool forwards bus levels to.
pub trait Mixer {
    /// Set the level of a mixer target, in decibels.
    fn set_level_db(&mut self, target: &str, db: f32);
}

/// Lets the host keep a handle on a mixer it also gave to the pool.
impl<M: Mixer> Mixer for Rc<RefCell<M>> {
    fn set_level_db(&mut self, target: &str, db: f32) {
        self.borrow_mut().set_level_db(target, db);
    }
}

/// Mixer that only remembers the levels it was given.
///
/// Used by hosts that poll levels (FFI, web) and by tests.
#[derive(Debug, Clone, Default)]
pub struct VirtualMixer {
    levels: HashMap<String, f32>,
}

impl VirtualMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level set on `target`, in decibels.
    pub fn level_db(&self, target: &str) -> Option<f32> {
        self.levels.get(target).copied()
    }
}

impl Mixer for VirtualMixer {
    fn set_level_db(&mut self, target: &str, db: f32) {
        self.levels.insert(target.to_owned(), db);
    }
}

/// Linear interpolation of `value` from `[from_lo, from_hi]` onto `[to_lo, to_hi]`.
#[inline]
pub fn remap(value: f32, from_lo: f32, from_hi: f32, to_lo: f32, to_hi: f32) -> f32 {
    to_lo + (value - from_lo) * (to_hi - to_lo) / (from_hi - from_lo)
}

/// Convert a normalized level in `[0, 1]` to decibels in `[-80, 0]`.
///
/// The level is remapped onto the linear gain range spanned by
/// `MIN_BUS_DB..=MAX_BUS_DB` and then taken to the log domain, so 0 maps to
/// -80 dB and 1 to 0 dB. Inputs outside `[0, 1]` are not clamped: below 0
/// the result drops under -80 dB and turns NaN, so callers clamp first.
pub fn level_to_db(level: f32) -> f32 {
    let min_gain = db_to_gain(MIN_BUS_DB);
    let max_gain = db_to_gain(MAX_BUS_DB);
    20.0 * remap(level, 0.0, 1.0, min_gain, max_gain).log10()
}

#[inline]
fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, -80.0)]
    #[case(1.0, 0.0)]
    #[case(0.5, -6.02)]
    #[case(0.1, -19.99)]
    fn test_level_to_db(#[case] level: f32, #[case] expected: f32) {
        let db = level_to_db(level);
        assert!(
            (db - expected).abs() < 0.01,
            "level {} gave {} dB, expected {}",
            level,
            db,
            expected
        );
    }

    #[test]
    fn test_level_to_db_is_monotonic() {
        let mut previous = level_to_db(0.0);
        for step in 1..=100 {
            let db = level_to_db(step as f32 / 100.0);
            assert!(db > previous);
            previous = db;
        }
    }

    #[test]
    fn test_negative_level_is_not_clamped() {
        assert!(level_to_db(-1.0).is_nan());
    }

    #[test]
    fn test_default_routing_maps_every_bus() {
        let routing = BusRouting::default();
        assert_eq!(routing.resolve(Bus::Master), Some("Master"));
        assert_eq!(routing.resolve(Bus::Music), Some("Music"));
        assert_eq!(routing.resolve(Bus::Effects), Some("Effects"));
    }

    #[test]
    fn test_unrouted_bus_resolves_to_none() {
        let mut routing = BusRouting::default();
        routing.set_target(Bus::Effects, None);
        assert_eq!(routing.resolve(Bus::Effects), None);

        let routing = BusRouting::unrouted().with_target(Bus::Music, "BGM");
        assert_eq!(routing.resolve(Bus::Music), Some("BGM"));
        assert_eq!(routing.resolve(Bus::Master), None);
    }

    #[test]
    fn test_bus_from_index() {
        assert_eq!(Bus::from_index(0), Some(Bus::Master));
        assert_eq!(Bus::from_index(2), Some(Bus::Effects));
        assert_eq!(Bus::from_index(3), None);
    }

    #[test]
    fn test_virtual_mixer_records_levels() {
        let mut mixer = VirtualMixer::new();
        mixer.set_level_db("Music", -12.0);
        assert_eq!(mixer.level_db("Music"), Some(-12.0));
        assert_eq!(mixer.level_db("Effects"), None);
    }
}
