// MIDI module - message model and transports

pub mod event;
pub mod transport;

pub use event::{MidiMessage, velocity_from_midi, velocity_to_midi};
pub use transport::{MemoryPort, MidiError, MidiPort, MidiPorts, MidirPort, NullPort, PortId};
