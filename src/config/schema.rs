//! Configuration schema definitions
//!
//! Every section defaults to the 36-field board: 2 rangefinders, 26 keys and
//! a 4-segment pressure strip.

use crate::engine::Control;
use crate::mapping::Scale;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for musicbox
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicBoxConfig {
    /// Where sensor lines come from
    #[serde(default)]
    pub input: InputConfig,

    /// Frame layout
    #[serde(default)]
    pub frame: FrameConfig,

    /// Key velocity sensors
    #[serde(default)]
    pub keys: KeysConfig,

    /// Rangefinders
    #[serde(default)]
    pub distance: DistanceConfig,

    /// Pressure strip
    #[serde(default)]
    pub aftertouch: AftertouchConfig,

    /// MIDI output
    #[serde(default)]
    pub midi: MidiConfig,

    /// Error policy
    #[serde(default)]
    pub errors: ErrorConfig,
}

impl MusicBoxConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let len = self.frame.length;
        if len == 0 {
            bail!("Frame length must be at least 1");
        }

        // Keys
        let keys = &self.keys;
        if keys.offset + keys.count > len {
            bail!(
                "Keys occupy fields {}..{} but frames only have {} fields",
                keys.offset,
                keys.offset + keys.count,
                len
            );
        }
        if keys.velocity_cap <= 0 {
            bail!("Velocity cap must be positive");
        }
        let vel = &keys.velocity;
        if vel.in_min == vel.in_max {
            bail!("Velocity input range is empty ({})", vel.in_min);
        }
        check_midi_range("Velocity output", vel.out_min, vel.out_max)?;
        let scale = keys.scale.resolve()?;
        let top = keys.scale.root as u32 + scale.intervals().iter().copied().max().unwrap_or(0) as u32;
        if top > 127 {
            bail!("Scale '{}' from root {} goes past MIDI note 127", scale.name(), keys.scale.root);
        }
        check_channel("Low key", keys.routing.low_channel)?;
        check_channel("High key", keys.routing.high_channel)?;

        // Distance
        let distance = &self.distance;
        if distance.enabled {
            if distance.sensors.is_empty() {
                bail!("Distance is enabled but no sensors are configured");
            }
            for sensor in &distance.sensors {
                if sensor.index >= len {
                    bail!("Distance sensor field {} is outside the {}-field frame", sensor.index, len);
                }
                if sensor.median_depth == 0 {
                    bail!("Median depth for distance sensor {} must be at least 1", sensor.index);
                }
            }
            if distance.clamp.min >= distance.clamp.max {
                bail!("Distance clamp band must have min below max");
            }
            check_midi_range("Distance output", distance.output.min, distance.output.max)?;
            check_channel("Distance", distance.channel)?;
            check_cc(distance.cc_number)?;
        }

        // Aftertouch
        let aftertouch = &self.aftertouch;
        if aftertouch.enabled {
            if aftertouch.segments.is_empty() {
                bail!("Aftertouch is enabled but no segments are configured");
            }
            for segment in &aftertouch.segments {
                if segment.index >= len {
                    bail!("Aftertouch segment field {} is outside the {}-field frame", segment.index, len);
                }
                if segment.in_min == segment.in_max {
                    bail!("Aftertouch segment {} has an empty input range", segment.index);
                }
            }
            if aftertouch.rms_range.min == aftertouch.rms_range.max {
                bail!("Aftertouch RMS range is empty");
            }
            check_midi_range("Aftertouch output", aftertouch.output.min, aftertouch.output.max)?;
            check_channel("Aftertouch", aftertouch.channel)?;
            check_cc(aftertouch.cc_number)?;
        }

        // MIDI
        for program in &self.midi.programs {
            check_channel("Program", program.channel)?;
            if program.program > 127 {
                bail!("Program {} is not a MIDI program number", program.program);
            }
        }

        Ok(())
    }
}

fn check_channel(what: &str, channel: u8) -> Result<()> {
    if channel > 15 {
        bail!("{} channel must be between 0 and 15, got {}", what, channel);
    }
    Ok(())
}

fn check_cc(number: u8) -> Result<()> {
    if number > 127 {
        bail!("CC number must be between 0 and 127, got {}", number);
    }
    Ok(())
}

fn check_midi_range(what: &str, min: i64, max: i64) -> Result<()> {
    for v in [min, max] {
        if !(0..=127).contains(&v) {
            bail!("{} range must lie within 0..=127, got {}..{}", what, min, max);
        }
    }
    Ok(())
}

/// Sensor input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Device node, capture file, or "-" for stdin (default: /dev/ttyACM0)
    #[serde(default = "default_input_path")]
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
        }
    }
}

fn default_input_path() -> PathBuf { PathBuf::from("/dev/ttyACM0") }

/// Frame layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Fields per line (default: 36)
    #[serde(default = "default_frame_length")]
    pub length: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            length: default_frame_length(),
        }
    }
}

fn default_frame_length() -> usize { 36 }

/// Key velocity sensors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// First key field in the frame (default: 2)
    #[serde(default = "default_keys_offset")]
    pub offset: usize,

    /// Number of keys (default: 26)
    #[serde(default = "default_keys_count")]
    pub count: usize,

    /// Largest raw velocity treated as a press (default: 400)
    #[serde(default = "default_velocity_cap")]
    pub velocity_cap: i64,

    /// Raw velocity to MIDI velocity calibration (default: 0..400 -> 124..62)
    #[serde(default)]
    pub velocity: VelocityMap,

    /// Send a fresh note-on when a held key's velocity changes (default: true)
    #[serde(default = "default_retrigger")]
    pub retrigger: bool,

    /// Pitches for the keys
    #[serde(default)]
    pub scale: ScaleConfig,

    /// Channel split between low and high keys
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            offset: default_keys_offset(),
            count: default_keys_count(),
            velocity_cap: default_velocity_cap(),
            velocity: VelocityMap::default(),
            retrigger: default_retrigger(),
            scale: ScaleConfig::default(),
            routing: RoutingConfig::default(),
        }
    }
}

fn default_keys_offset() -> usize { 2 }
fn default_keys_count() -> usize { 26 }
fn default_velocity_cap() -> i64 { 400 }
fn default_retrigger() -> bool { true }

/// Linear calibration from raw sensor values to MIDI velocity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityMap {
    pub in_min: i64,
    pub in_max: i64,
    pub out_min: i64,
    pub out_max: i64,
}

impl Default for VelocityMap {
    fn default() -> Self {
        Self {
            in_min: 0,
            in_max: 400,
            out_min: 124,
            out_max: 62,
        }
    }
}

/// Key-to-pitch table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// MIDI note of key 0 (default: 60)
    #[serde(default = "default_root")]
    pub root: u8,

    /// Named scale (default: chromatic)
    #[serde(default = "default_scale_name")]
    pub name: String,

    /// Explicit intervals in semitones, overriding `name`
    #[serde(default)]
    pub intervals: Option<Vec<u8>>,
}

impl ScaleConfig {
    /// Build the scale this configuration describes
    pub fn resolve(&self) -> Result<Scale> {
        match &self.intervals {
            Some(intervals) if intervals.is_empty() => bail!("Scale intervals must not be empty"),
            Some(intervals) => Ok(Scale::new("custom", intervals.clone())),
            None => match Scale::from_name(&self.name) {
                Some(scale) => Ok(scale),
                None => bail!("Unknown scale '{}'", self.name),
            },
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            name: default_scale_name(),
            intervals: None,
        }
    }
}

fn default_root() -> u8 { 60 }
fn default_scale_name() -> String { "chromatic".to_string() }

/// Routes keys to MIDI channels by index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Keys with a higher index go to `high_channel` (default: 12, None = all low)
    #[serde(default = "default_split_above")]
    pub split_above: Option<usize>,

    #[serde(default)]
    pub low_channel: u8,

    #[serde(default = "default_high_channel")]
    pub high_channel: u8,
}

impl RoutingConfig {
    pub fn channel_for(&self, key: usize) -> u8 {
        match self.split_above {
            Some(split) if key > split => self.high_channel,
            _ => self.low_channel,
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            split_above: default_split_above(),
            low_channel: 0,
            high_channel: default_high_channel(),
        }
    }
}

fn default_split_above() -> Option<usize> { Some(12) }
fn default_high_channel() -> u8 { 1 }

/// An inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: i64,
    pub max: i64,
}

impl Span {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// Where a continuous value is sent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// 14-bit pitch bend
    PitchBend,
    /// Channel aftertouch
    ChannelPressure,
    /// Control change; number taken from `cc_number`
    ControlChange,
}

fn to_control(kind: ControllerKind, cc_number: u8) -> Control {
    match kind {
        ControllerKind::PitchBend => Control::PitchBend,
        ControllerKind::ChannelPressure => Control::ChannelPressure,
        ControllerKind::ControlChange => Control::ControlChange(cc_number),
    }
}

/// One rangefinder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceSensor {
    /// Field in the frame
    pub index: usize,

    /// Median filter depth (default: 15)
    #[serde(default = "default_median_depth")]
    pub median_depth: usize,
}

fn default_median_depth() -> usize { 15 }

/// Rangefinders to a single continuous control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Sensors, fields 0 and 1 by default
    #[serde(default = "default_distance_sensors")]
    pub sensors: Vec<DistanceSensor>,

    /// Valid band for filtered readings (default: 250..2500)
    #[serde(default = "default_distance_clamp")]
    pub clamp: Span,

    /// Readings above this count as "nothing in range" and jump to the far
    /// edge of the band (default: 2000)
    #[serde(default = "default_snap_above")]
    pub snap_above: Option<i64>,

    /// Output range (default: 0..127)
    #[serde(default = "default_midi_span")]
    pub output: Span,

    /// Destination (default: pitch_bend)
    #[serde(default = "default_distance_controller")]
    pub controller: ControllerKind,

    /// Controller number when `controller` is control_change (default: 1)
    #[serde(default = "default_cc_number")]
    pub cc_number: u8,

    #[serde(default)]
    pub channel: u8,
}

impl DistanceConfig {
    pub fn control(&self) -> Control {
        to_control(self.controller, self.cc_number)
    }
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sensors: default_distance_sensors(),
            clamp: default_distance_clamp(),
            snap_above: default_snap_above(),
            output: default_midi_span(),
            controller: default_distance_controller(),
            cc_number: default_cc_number(),
            channel: 0,
        }
    }
}

fn default_enabled() -> bool { true }
fn default_distance_sensors() -> Vec<DistanceSensor> {
    vec![
        DistanceSensor { index: 0, median_depth: default_median_depth() },
        DistanceSensor { index: 1, median_depth: default_median_depth() },
    ]
}
fn default_distance_clamp() -> Span { Span::new(250, 2500) }
fn default_snap_above() -> Option<i64> { Some(2000) }
fn default_midi_span() -> Span { Span::new(0, 127) }
fn default_distance_controller() -> ControllerKind { ControllerKind::PitchBend }
fn default_cc_number() -> u8 { 1 }

/// One section of the pressure strip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressureSegment {
    /// Field in the frame
    pub index: usize,
    /// Raw reading at rest
    pub in_min: i64,
    /// Raw reading at full pressure
    pub in_max: i64,
}

/// Pressure strip to aftertouch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AftertouchConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Segments, fields 28..32 by default
    #[serde(default = "default_segments")]
    pub segments: Vec<PressureSegment>,

    /// Common scale every segment is mapped into (default: 0..500)
    #[serde(default = "default_normalized")]
    pub normalized: Span,

    /// RMS values below this send zero (default: 250)
    #[serde(default = "default_threshold")]
    pub threshold: i64,

    /// RMS range mapped onto the output (default: 150..300)
    #[serde(default = "default_rms_range")]
    pub rms_range: Span,

    /// Output range (default: 0..127)
    #[serde(default = "default_midi_span")]
    pub output: Span,

    /// Destination (default: channel_pressure)
    #[serde(default = "default_aftertouch_controller")]
    pub controller: ControllerKind,

    /// Controller number when `controller` is control_change (default: 1)
    #[serde(default = "default_cc_number")]
    pub cc_number: u8,

    #[serde(default)]
    pub channel: u8,
}

impl AftertouchConfig {
    pub fn control(&self) -> Control {
        to_control(self.controller, self.cc_number)
    }
}

impl Default for AftertouchConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            segments: default_segments(),
            normalized: default_normalized(),
            threshold: default_threshold(),
            rms_range: default_rms_range(),
            output: default_midi_span(),
            controller: default_aftertouch_controller(),
            cc_number: default_cc_number(),
            channel: 0,
        }
    }
}

fn default_segments() -> Vec<PressureSegment> {
    vec![
        PressureSegment { index: 28, in_min: 0, in_max: 200 },
        PressureSegment { index: 29, in_min: 150, in_max: 320 },
        PressureSegment { index: 30, in_min: 250, in_max: 450 },
        PressureSegment { index: 31, in_min: 300, in_max: 520 },
    ]
}
fn default_normalized() -> Span { Span::new(0, 500) }
fn default_threshold() -> i64 { 250 }
fn default_rms_range() -> Span { Span::new(150, 300) }
fn default_aftertouch_controller() -> ControllerKind { ControllerKind::ChannelPressure }

/// MIDI output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MidiConfig {
    /// Output port name or a substring of it (None = first port)
    #[serde(default)]
    pub port: Option<String>,

    /// Program changes sent on connect (default: grand piano on channels 0 and 1)
    #[serde(default = "default_programs")]
    pub programs: Vec<ProgramConfig>,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            port: None,
            programs: default_programs(),
        }
    }
}

/// Instrument for one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub channel: u8,
    pub program: u8,
}

fn default_programs() -> Vec<ProgramConfig> {
    vec![
        ProgramConfig { channel: 0, program: 0 },
        ProgramConfig { channel: 1, program: 0 },
    ]
}

/// What to do about bad lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorConfig {
    /// Give up after more than this many bad lines in a row (default: 20)
    #[serde(default = "default_max_consecutive")]
    pub max_consecutive: u32,

    /// Send note-offs for held keys before giving up (default: true)
    #[serde(default = "default_release_on_abort")]
    pub release_on_abort: bool,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            max_consecutive: default_max_consecutive(),
            release_on_abort: default_release_on_abort(),
        }
    }
}

fn default_max_consecutive() -> u32 { 20 }
fn default_release_on_abort() -> bool { true }
