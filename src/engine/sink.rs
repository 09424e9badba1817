//! Output sinks
//!
//! Everything the pipeline produces goes through [`OutputSink`]: note on,
//! note off, and continuous control values.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Destination of a continuous control value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Pitch bend; the 7-bit value becomes the coarse half of the bend
    PitchBend,
    /// Channel aftertouch
    ChannelPressure,
    /// Control change with the given controller number
    ControlChange(u8),
}

/// One emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NoteOn { pitch: u8, velocity: u8, channel: u8 },
    NoteOff { pitch: u8, velocity: u8, channel: u8 },
    Control { control: Control, channel: u8, value: u8 },
}

/// Anything that can play the pipeline's output
pub trait OutputSink {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<()>;

    fn note_off(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<()>;

    fn control_change(&mut self, control: Control, channel: u8, value: u8) -> Result<()>;

    /// Dispatch an event to the matching operation
    fn emit(&mut self, event: &Event) -> Result<()> {
        match *event {
            Event::NoteOn { pitch, velocity, channel } => self.note_on(pitch, velocity, channel),
            Event::NoteOff { pitch, velocity, channel } => self.note_off(pitch, velocity, channel),
            Event::Control { control, channel, value } => self.control_change(control, channel, value),
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take the recorded events, leaving the log empty
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Only the note on/off events
    pub fn notes(&self) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| !matches!(e, Event::Control { .. }))
            .copied()
            .collect()
    }
}

impl OutputSink for EventLog {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<()> {
        self.events.push(Event::NoteOn { pitch, velocity, channel });
        Ok(())
    }

    fn note_off(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<()> {
        self.events.push(Event::NoteOff { pitch, velocity, channel });
        Ok(())
    }

    fn control_change(&mut self, control: Control, channel: u8, value: u8) -> Result<()> {
        self.events.push(Event::Control { control, channel, value });
        Ok(())
    }
}

/// Sink that writes one JSON object per event
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, event: Event) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> OutputSink for JsonSink<W> {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<()> {
        self.write(Event::NoteOn { pitch, velocity, channel })
    }

    fn note_off(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<()> {
        self.write(Event::NoteOff { pitch, velocity, channel })
    }

    fn control_change(&mut self, control: Control, channel: u8, value: u8) -> Result<()> {
        self.write(Event::Control { control, channel, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_in_order() {
        let mut log = EventLog::new();
        log.note_on(60, 100, 0).unwrap();
        log.control_change(Control::PitchBend, 0, 64).unwrap();
        log.note_off(60, 100, 0).unwrap();

        assert_eq!(log.events().len(), 3);
        assert_eq!(log.notes().len(), 2);
        assert_eq!(log.events()[1], Event::Control { control: Control::PitchBend, channel: 0, value: 64 });

        let drained = log.drain();
        assert_eq!(drained.len(), 3);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_emit_dispatches() {
        let mut log = EventLog::new();
        let event = Event::NoteOff { pitch: 61, velocity: 0, channel: 1 };
        log.emit(&event).unwrap();
        assert_eq!(log.events(), &[event]);
    }

    #[test]
    fn test_json_sink_lines() {
        let mut sink = JsonSink::new(Vec::new());
        sink.note_on(60, 116, 0).unwrap();
        sink.control_change(Control::ControlChange(11), 2, 5).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"type":"note_on","pitch":60,"velocity":116,"channel":0}"#);

        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["type"], "control");
        assert_eq!(value["control"]["control_change"], 11);
        assert_eq!(value["value"], 5);
    }
}
