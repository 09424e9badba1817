//! MIDI output for musicbox.
//!
//! Sends pipeline events to a MIDI port through midir.

use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::{anyhow, Result};
use midir::MidiOutput;
use tracing::{info, warn};

use super::{Control, OutputSink};
use crate::config::ProgramConfig;

/// MIDI message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note on: channel (0-15), note (0-127), velocity (0-127)
    NoteOn(u8, u8, u8),
    /// Note off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff(u8, u8, u8),
    /// Control change: channel (0-15), controller (0-127), value (0-127)
    ControlChange(u8, u8, u8),
    /// Program change: channel (0-15), program (0-127)
    ProgramChange(u8, u8),
    /// Channel pressure: channel (0-15), pressure (0-127)
    ChannelPressure(u8, u8),
    /// Pitch bend: channel (0-15), value (0-16383, center at 8192)
    PitchBend(u8, u16),
}

impl MidiMessage {
    /// Message for a 7-bit control value sent to `control`
    pub fn for_control(control: Control, channel: u8, value: u8) -> Self {
        match control {
            Control::PitchBend => MidiMessage::PitchBend(channel, ((value & 0x7F) as u16) << 7),
            Control::ChannelPressure => MidiMessage::ChannelPressure(channel, value),
            Control::ControlChange(number) => MidiMessage::ControlChange(channel, number, value),
        }
    }

    /// Convert to raw MIDI bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOn(ch, note, vel) => vec![0x90 | (ch & 0x0F), note & 0x7F, vel & 0x7F],
            MidiMessage::NoteOff(ch, note, vel) => {
                vec![0x80 | (ch & 0x0F), note & 0x7F, vel & 0x7F]
            }
            MidiMessage::ControlChange(ch, ctrl, val) => {
                vec![0xB0 | (ch & 0x0F), ctrl & 0x7F, val & 0x7F]
            }
            MidiMessage::ProgramChange(ch, prog) => vec![0xC0 | (ch & 0x0F), prog & 0x7F],
            MidiMessage::ChannelPressure(ch, val) => vec![0xD0 | (ch & 0x0F), val & 0x7F],
            MidiMessage::PitchBend(ch, val) => {
                let lsb = (val & 0x7F) as u8;
                let msb = ((val >> 7) & 0x7F) as u8;
                vec![0xE0 | (ch & 0x0F), lsb, msb]
            }
        }
    }
}

/// MIDI output player.
pub struct MidiPlayer {
    sender: Sender<MidiPlayerCommand>,
}

enum MidiPlayerCommand {
    Send(MidiMessage),
    Stop,
}

impl MidiPlayer {
    /// Create a new MIDI player connected to the given port.
    ///
    /// `port_name` matches any port whose name contains it; `None` picks the
    /// first port.
    pub fn new(port_name: Option<&str>) -> Result<Self> {
        let midi_out = MidiOutput::new("musicbox")?;
        let ports = midi_out.ports();

        if ports.is_empty() {
            return Err(anyhow!("No MIDI output ports available"));
        }

        let port = if let Some(name) = port_name {
            ports
                .iter()
                .find(|p| {
                    midi_out
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("MIDI port '{}' not found", name))?
                .clone()
        } else {
            ports[0].clone()
        };

        let port_name_actual = midi_out.port_name(&port)?;
        let conn = midi_out
            .connect(&port, "musicbox-output")
            .map_err(|e| anyhow!("failed to connect to MIDI port '{}': {}", port_name_actual, e))?;

        let (sender, receiver) = mpsc::channel::<MidiPlayerCommand>();

        // Spawn thread to handle MIDI messages
        thread::spawn(move || {
            let mut conn = conn;
            while let Ok(cmd) = receiver.recv() {
                match cmd {
                    MidiPlayerCommand::Send(msg) => {
                        if let Err(e) = conn.send(&msg.to_bytes()) {
                            warn!("MIDI send failed: {}", e);
                        }
                    }
                    MidiPlayerCommand::Stop => break,
                }
            }
            conn.close();
        });

        info!("MIDI output connected to: {}", port_name_actual);

        Ok(Self { sender })
    }

    /// Select instruments.
    pub fn set_programs(&self, programs: &[ProgramConfig]) -> Result<()> {
        for program in programs {
            self.send(MidiMessage::ProgramChange(program.channel, program.program))?;
        }
        Ok(())
    }

    /// Send a raw MIDI message.
    pub fn send(&self, msg: MidiMessage) -> Result<()> {
        self.sender
            .send(MidiPlayerCommand::Send(msg))
            .map_err(|_| anyhow!("MIDI output thread has stopped"))?;
        Ok(())
    }

    /// Stop the MIDI player.
    pub fn stop(&self) {
        let _ = self.sender.send(MidiPlayerCommand::Stop);
    }
}

impl OutputSink for MidiPlayer {
    fn note_on(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<()> {
        self.send(MidiMessage::NoteOn(channel, pitch, velocity))
    }

    fn note_off(&mut self, pitch: u8, velocity: u8, channel: u8) -> Result<()> {
        self.send(MidiMessage::NoteOff(channel, pitch, velocity))
    }

    fn control_change(&mut self, control: Control, channel: u8, value: u8) -> Result<()> {
        self.send(MidiMessage::for_control(control, channel, value))
    }
}

impl Drop for MidiPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// List available MIDI output ports.
pub fn list_midi_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("musicbox port list")?;
    let ports = midi_out.ports();

    let names: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok(names)
}
