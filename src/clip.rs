// src/clip.rs
//
// Clip handles.
//
// The pool never touches sample data. A clip is an opaque handle the host
// loaded elsewhere; the pool only needs its identity and its duration.

use std::collections::HashMap;

/// Identifier for a clip, assigned by the host or by a `ClipBank`.
pub type ClipId = u32;

/// An opaque playable clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    id: ClipId,
    name: String,
    /// Length in seconds.
    duration: f64,
}

impl Clip {
    pub fn new(id: ClipId, name: impl Into<String>, duration: f64) -> Self {
        Self {
            id,
            name: name.into(),
            duration,
        }
    }

    #[inline]
    pub fn id(&self) -> ClipId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// Registry of clips for hosts that only hold integer ids (FFI, web).
#[derive(Debug, Default)]
pub struct ClipBank {
    clips: HashMap<ClipId, Clip>,
    next_id: ClipId,
}

impl ClipBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip and return its id.
    pub fn register(&mut self, name: impl Into<String>, duration: f64) -> ClipId {
        let id = self.next_id;
        self.next_id += 1;
        self.clips.insert(id, Clip::new(id, name, duration));
        id
    }

    /// Remove a clip. Voices already playing it keep their own copy.
    pub fn unregister(&mut self, id: ClipId) -> Option<Clip> {
        self.clips.remove(&id)
    }

    /// Look up a clip. Unknown ids resolve to `None`, the absent clip.
    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.clips.get(&id)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_assigns_distinct_ids() {
        let mut bank = ClipBank::new();
        let a = bank.register("laser", 0.5);
        let b = bank.register("explosion", 1.5);

        assert_ne!(a, b);
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.get(b).map(Clip::duration), Some(1.5));
    }

    #[test]
    fn test_unregistered_clip_is_absent() {
        let mut bank = ClipBank::new();
        let id = bank.register("laser", 0.5);

        assert!(bank.unregister(id).is_some());
        assert!(bank.get(id).is_none());
        assert!(bank.get(999).is_none());
        assert!(bank.is_empty());
    }
}
