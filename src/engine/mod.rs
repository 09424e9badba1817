//! Event engine for musicbox
//!
//! Owns every per-channel piece of state (key trackers, distance filters,
//! pressure calibration) and turns one frame at a time into output events.

mod aftertouch;
mod distance;
mod keys;
mod midi;
mod runner;
mod sink;

pub use aftertouch::AftertouchConverter;
pub use distance::DistanceConverter;
pub use keys::{KeyState, KeyVelocityTracker};
pub use midi::{list_midi_ports, MidiMessage, MidiPlayer};
pub use runner::{request_stop, RunSummary, Runner};
pub use sink::{Control, Event, EventLog, JsonSink, OutputSink};

use crate::config::MusicBoxConfig;
use crate::sources::Frame;
use anyhow::Result;
use tracing::trace;

/// A continuous output: where it goes and the converter feeding it
struct ControlOutput<C> {
    converter: C,
    control: Control,
    channel: u8,
}

/// The frame-to-events pipeline
pub struct Engine {
    frame_len: usize,
    key_offset: usize,
    keys: KeyVelocityTracker,
    distance: Option<ControlOutput<DistanceConverter>>,
    aftertouch: Option<ControlOutput<AftertouchConverter>>,
}

impl Engine {
    /// Create an engine from a validated configuration
    pub fn new(config: &MusicBoxConfig) -> Result<Self> {
        let scale = config.keys.scale.resolve()?;
        let keys = KeyVelocityTracker::from_config(&config.keys, scale)?;

        let distance = if config.distance.enabled {
            Some(ControlOutput {
                converter: DistanceConverter::from_config(&config.distance)?,
                control: config.distance.control(),
                channel: config.distance.channel,
            })
        } else {
            None
        };

        let aftertouch = if config.aftertouch.enabled {
            Some(ControlOutput {
                converter: AftertouchConverter::from_config(&config.aftertouch)?,
                control: config.aftertouch.control(),
                channel: config.aftertouch.channel,
            })
        } else {
            None
        };

        Ok(Self {
            frame_len: config.frame.length,
            key_offset: config.keys.offset,
            keys,
            distance,
            aftertouch,
        })
    }

    /// Fields per frame this engine expects
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn keys(&self) -> &KeyVelocityTracker {
        &self.keys
    }

    /// Process one frame: key events in key order, then distance, then aftertouch
    ///
    /// # Panics
    ///
    /// Panics if the frame is shorter than [`frame_len`](Self::frame_len).
    pub fn process(&mut self, frame: &Frame, sink: &mut dyn OutputSink) -> Result<()> {
        assert!(
            frame.len() >= self.frame_len,
            "frame has {} fields, engine expects {}",
            frame.len(),
            self.frame_len
        );

        let key_samples = &frame.samples()[self.key_offset..self.key_offset + self.keys.len()];
        for event in self.keys.process(key_samples) {
            sink.emit(&event)?;
        }

        if let Some(out) = &mut self.distance {
            let value = out.converter.process(frame);
            trace!(value, "distance");
            sink.control_change(out.control, out.channel, value)?;
        }

        if let Some(out) = &self.aftertouch {
            let value = out.converter.process(frame);
            trace!(value, "aftertouch");
            sink.control_change(out.control, out.channel, value)?;
        }

        Ok(())
    }

    /// Send note-offs for every held key
    pub fn release_all(&mut self, sink: &mut dyn OutputSink) -> Result<usize> {
        let released = self.keys.release_all();
        for event in &released {
            sink.emit(event)?;
        }
        Ok(released.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PressureSegment, Span};
    use crate::sources::FrameParser;

    /// A 36-field line: rangefinders, 26 keys, strip segments, 4 spare
    fn line(distances: [i64; 2], keys: &[(usize, i64)], strip: [i64; 4]) -> String {
        let mut fields = vec![0i64; 36];
        fields[0] = distances[0];
        fields[1] = distances[1];
        for &(key, v) in keys {
            fields[2 + key] = v;
        }
        fields[28..32].copy_from_slice(&strip);
        fields.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
    }

    const REST: [i64; 4] = [0, 150, 250, 300];

    fn run(engine: &mut Engine, lines: &[String]) -> EventLog {
        let parser = FrameParser::new(engine.frame_len());
        let mut log = EventLog::new();
        for l in lines {
            let frame = parser.parse(l).unwrap();
            engine.process(&frame, &mut log).unwrap();
        }
        log
    }

    #[test]
    fn test_idle_frame() {
        let mut engine = Engine::new(&MusicBoxConfig::default()).unwrap();
        let log = run(&mut engine, &[line([250, 250], &[], REST)]);

        assert!(log.notes().is_empty());
        assert_eq!(
            log.events(),
            &[
                Event::Control { control: Control::PitchBend, channel: 0, value: 0 },
                Event::Control { control: Control::ChannelPressure, channel: 0, value: 0 },
            ]
        );
    }

    #[test]
    fn test_event_order_within_frame() {
        let mut engine = Engine::new(&MusicBoxConfig::default()).unwrap();
        let log = run(&mut engine, &[line([250, 250], &[(20, 50), (3, 50)], REST)]);

        let events = log.events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], Event::NoteOn { pitch: 63, velocity: 116, channel: 0 });
        assert_eq!(events[1], Event::NoteOn { pitch: 67, velocity: 116, channel: 1 });
        assert!(matches!(events[2], Event::Control { control: Control::PitchBend, .. }));
        assert!(matches!(events[3], Event::Control { control: Control::ChannelPressure, .. }));
    }

    #[test]
    fn test_note_lifecycle_across_frames() {
        let mut engine = Engine::new(&MusicBoxConfig::default()).unwrap();
        let lines = vec![
            line([250, 250], &[], REST),
            line([250, 250], &[(0, 50)], REST),
            line([250, 250], &[(0, 50)], REST),
            line([250, 250], &[], REST),
        ];
        let log = run(&mut engine, &lines);

        assert_eq!(
            log.notes(),
            vec![
                Event::NoteOn { pitch: 60, velocity: 116, channel: 0 },
                Event::NoteOff { pitch: 60, velocity: 116, channel: 0 },
            ]
        );
        // Two controls per frame, every frame
        assert_eq!(log.events().len() - log.notes().len(), 8);
    }

    #[test]
    fn test_distance_settles_through_median() {
        let mut config = MusicBoxConfig::default();
        config.aftertouch.enabled = false;
        for sensor in &mut config.distance.sensors {
            sensor.median_depth = 3;
        }
        let mut engine = Engine::new(&config).unwrap();

        let lines: Vec<String> = (0..3).map(|_| line([300, 900], &[], REST)).collect();
        let log = run(&mut engine, &lines);

        let values: Vec<u8> = log
            .events()
            .iter()
            .map(|e| match e {
                Event::Control { value, .. } => *value,
                _ => panic!("unexpected note"),
            })
            .collect();
        // Zeros in the history clamp to the near edge until the median fills
        assert_eq!(values, vec![0, 2, 2]);
    }

    #[test]
    fn test_disabled_controls_are_silent() {
        let mut config = MusicBoxConfig::default();
        config.distance.enabled = false;
        config.aftertouch.enabled = false;
        let mut engine = Engine::new(&config).unwrap();

        let log = run(&mut engine, &[line([250, 250], &[], REST)]);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_release_all() {
        let mut engine = Engine::new(&MusicBoxConfig::default()).unwrap();
        run(&mut engine, &[line([250, 250], &[(0, 10), (15, 10)], REST)]);

        let mut log = EventLog::new();
        assert_eq!(engine.release_all(&mut log).unwrap(), 2);
        assert_eq!(
            log.events(),
            &[
                Event::NoteOff { pitch: 60, velocity: 122, channel: 0 },
                Event::NoteOff { pitch: 62, velocity: 122, channel: 1 },
            ]
        );
        assert_eq!(engine.release_all(&mut log).unwrap(), 0);
    }

    #[test]
    fn test_sixteen_field_layout() {
        let mut config = MusicBoxConfig::default();
        config.frame.length = 16;
        config.keys.count = 13;
        config.keys.routing.split_above = None;
        config.aftertouch.segments = vec![PressureSegment { index: 15, in_min: 400, in_max: 800 }];
        config.aftertouch.normalized = Span::new(400, 800);
        config.aftertouch.threshold = 400;
        config.aftertouch.rms_range = Span::new(400, 800);
        config.validate().unwrap();

        let mut engine = Engine::new(&config).unwrap();
        let parser = FrameParser::new(16);
        let frame = parser.parse("250,250,0,0,0,0,0,0,0,0,0,0,0,0,90,600").unwrap();
        let mut log = EventLog::new();
        engine.process(&frame, &mut log).unwrap();

        assert_eq!(
            log.events(),
            &[
                Event::NoteOn { pitch: 72, velocity: 110, channel: 0 },
                Event::Control { control: Control::PitchBend, channel: 0, value: 0 },
                Event::Control { control: Control::ChannelPressure, channel: 0, value: 63 },
            ]
        );
    }

    fn with_field(line: String, index: usize, value: &str) -> String {
        let mut fields: Vec<&str> = line.split(',').collect();
        fields[index] = value;
        fields.join(",")
    }

    #[test]
    fn test_huge_pressure_reading_saturates() {
        let mut engine = Engine::new(&MusicBoxConfig::default()).unwrap();
        let l = with_field(line([250, 250], &[], REST), 28, "1e17");
        let log = run(&mut engine, &[l]);

        assert_eq!(
            log.events().last(),
            Some(&Event::Control { control: Control::ChannelPressure, channel: 0, value: 84 })
        );
    }

    #[test]
    fn test_huge_negative_pressure_reading_is_silent() {
        let mut engine = Engine::new(&MusicBoxConfig::default()).unwrap();
        let l = with_field(line([250, 250], &[], REST), 28, "-1e19");
        let log = run(&mut engine, &[l]);

        assert_eq!(
            log.events().last(),
            Some(&Event::Control { control: Control::ChannelPressure, channel: 0, value: 0 })
        );
    }

    #[test]
    #[should_panic]
    fn test_short_frame_panics() {
        let mut engine = Engine::new(&MusicBoxConfig::default()).unwrap();
        let frame = Frame::new(vec![0; 10]);
        let _ = engine.process(&frame, &mut EventLog::new());
    }
}
