//! musicbox - Sensor board to MIDI
//!
//! Reads comma separated frames of key velocities, rangefinder distances and
//! pressure strip readings from a serial line and plays them as MIDI notes,
//! pitch bend and aftertouch.

pub mod config;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod sources;

pub use config::MusicBoxConfig;
pub use engine::Engine;
