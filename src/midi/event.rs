// MIDI message types - parsed from and encoded to raw bytes

/// Encoded form of a channel message (at most three bytes, no allocation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiBytes {
    data: [u8; 3],
    len: u8,
}

impl MidiBytes {
    fn new(data: [u8; 3], len: u8) -> Self {
        Self { data, len }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

/// A MIDI message. Channels are 0-based (0..=15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    PitchBend { channel: u8, value: u16 },
    /// Anything outside the vocabulary above: sysex, realtime, truncated
    /// messages. Kept only so it can be counted and dropped.
    Unknown { status: u8 },
}

impl MidiMessage {
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        MidiMessage::NoteOn {
            channel: channel & 0x0F,
            note: note & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    pub fn note_off(channel: u8, note: u8) -> Self {
        MidiMessage::NoteOff {
            channel: channel & 0x0F,
            note: note & 0x7F,
            velocity: 0,
        }
    }

    /// Parse a raw MIDI message.
    ///
    /// Never fails: anything that is not a complete channel message of a
    /// known kind becomes `Unknown`. A Note-On with velocity 0 stays a Note-On
    /// here so it can be echoed verbatim.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let Some(&status) = bytes.first() else {
            return MidiMessage::Unknown { status: 0 };
        };
        let channel = status & 0x0F;
        let data = |index: usize| bytes.get(index).map(|byte| byte & 0x7F);

        let parsed = match status & 0xF0 {
            0x90 => data(1).zip(data(2)).map(|(note, velocity)| MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            }),
            0x80 => data(1).zip(data(2)).map(|(note, velocity)| MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            }),
            0xB0 => data(1)
                .zip(data(2))
                .map(|(controller, value)| MidiMessage::ControlChange {
                    channel,
                    controller,
                    value,
                }),
            0xC0 => data(1).map(|program| MidiMessage::ProgramChange { channel, program }),
            0xD0 => data(1).map(|pressure| MidiMessage::ChannelPressure { channel, pressure }),
            0xE0 => data(1).zip(data(2)).map(|(lsb, msb)| MidiMessage::PitchBend {
                channel,
                value: ((msb as u16) << 7) | lsb as u16,
            }),
            _ => None,
        };

        parsed.unwrap_or(MidiMessage::Unknown { status })
    }

    /// Encode back to wire bytes. `Unknown` encodes to nothing.
    pub fn to_bytes(&self) -> MidiBytes {
        match *self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => MidiBytes::new([0x90 | channel, note, velocity], 3),
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => MidiBytes::new([0x80 | channel, note, velocity], 3),
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => MidiBytes::new([0xB0 | channel, controller, value], 3),
            MidiMessage::ProgramChange { channel, program } => {
                MidiBytes::new([0xC0 | channel, program, 0], 2)
            }
            MidiMessage::ChannelPressure { channel, pressure } => {
                MidiBytes::new([0xD0 | channel, pressure, 0], 2)
            }
            MidiMessage::PitchBend { channel, value } => MidiBytes::new(
                [0xE0 | channel, (value & 0x7F) as u8, ((value >> 7) & 0x7F) as u8],
                3,
            ),
            MidiMessage::Unknown { .. } => MidiBytes::new([0; 3], 0),
        }
    }

    /// Channel of a channel message; `None` for unknown messages
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::ChannelPressure { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => Some(channel),
            MidiMessage::Unknown { .. } => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, MidiMessage::Unknown { .. })
    }
}

/// Scale a 0.0..=1.0 velocity to the MIDI 0..=127 range (truncating)
pub fn velocity_to_midi(velocity: f32) -> u8 {
    (velocity.clamp(0.0, 1.0) * 127.0) as u8
}

/// Scale a MIDI velocity to 0.0..=1.0
pub fn velocity_from_midi(velocity: u8) -> f32 {
    (velocity & 0x7F) as f32 / 127.0
}
