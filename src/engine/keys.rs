//! Key velocity tracking
//!
//! Each key reports a raw velocity every frame while it is held and zero
//! when it is up. Notes fire on the edges: a note-on when a key leaves zero
//! (or, with retriggering, when a held key's velocity changes), a note-off
//! when it returns to zero.

use super::Event;
use crate::config::{KeysConfig, RoutingConfig};
use crate::error::RangeError;
use crate::mapping::{note_name, RangeMapper, Scale};
use tracing::debug;

/// Per-key state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    /// Most recent accepted raw velocity, 0 when the key is up
    pub last_velocity: i64,
}

impl KeyState {
    pub fn is_on(&self) -> bool {
        self.last_velocity != 0
    }
}

/// Turns raw velocity samples into note events
#[derive(Debug, Clone)]
pub struct KeyVelocityTracker {
    keys: Vec<KeyState>,
    velocity_cap: i64,
    velocity: RangeMapper,
    retrigger: bool,
    root: u8,
    scale: Scale,
    routing: RoutingConfig,
}

impl KeyVelocityTracker {
    pub fn new(
        count: usize,
        velocity_cap: i64,
        velocity: RangeMapper,
        root: u8,
        scale: Scale,
        routing: RoutingConfig,
    ) -> Self {
        Self {
            keys: vec![KeyState::default(); count],
            velocity_cap,
            velocity,
            retrigger: true,
            root,
            scale,
            routing,
        }
    }

    /// Build a tracker from the keys section of the configuration
    pub fn from_config(config: &KeysConfig, scale: Scale) -> Result<Self, RangeError> {
        let v = &config.velocity;
        let velocity = RangeMapper::new(v.in_min, v.in_max, v.out_min, v.out_max)?;
        Ok(Self::new(
            config.count,
            config.velocity_cap,
            velocity,
            config.scale.root,
            scale,
            config.routing.clone(),
        )
        .with_retrigger(config.retrigger))
    }

    /// Set whether a velocity change on a held key sends a new note-on
    pub fn with_retrigger(mut self, retrigger: bool) -> Self {
        self.retrigger = retrigger;
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn state(&self, key: usize) -> KeyState {
        self.keys[key]
    }

    pub fn pitch_for(&self, key: usize) -> u8 {
        self.scale.pitch(self.root, key)
    }

    pub fn channel_for(&self, key: usize) -> u8 {
        self.routing.channel_for(key)
    }

    /// MIDI velocity for a raw sample, clamped into the calibrated range
    pub fn midi_velocity(&self, raw: i64) -> u8 {
        self.velocity.map_clamped(raw).clamp(0, 127) as u8
    }

    /// Feed one raw sample for `key`
    ///
    /// Samples outside `0..=velocity_cap` are dropped without touching the
    /// key's state.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not below [`len`](Self::len).
    pub fn update(&mut self, key: usize, raw: i64) -> Option<Event> {
        let last = self.keys[key].last_velocity;

        if raw < 0 || raw > self.velocity_cap || raw == last {
            return None;
        }

        self.keys[key].last_velocity = raw;
        let pitch = self.pitch_for(key);
        let channel = self.channel_for(key);

        if raw == 0 {
            return Some(Event::NoteOff {
                pitch,
                velocity: self.midi_velocity(last),
                channel,
            });
        }

        if last != 0 && !self.retrigger {
            return None;
        }

        debug!(key, note = note_name(pitch), pitch, raw, "key down");
        Some(Event::NoteOn {
            pitch,
            velocity: self.midi_velocity(raw),
            channel,
        })
    }

    /// Feed one sample per key, in key order
    pub fn process(&mut self, samples: &[i64]) -> Vec<Event> {
        assert_eq!(samples.len(), self.keys.len(), "one sample per key");
        samples
            .iter()
            .enumerate()
            .filter_map(|(key, &raw)| self.update(key, raw))
            .collect()
    }

    /// Note-offs for every held key; all keys end up off
    pub fn release_all(&mut self) -> Vec<Event> {
        (0..self.keys.len())
            .filter_map(|key| self.update(key, 0))
            .collect()
    }
}
