// Drum machine core - Library exports for the binary, tests and benchmarks

pub mod config;
pub mod menu;
pub mod midi;
pub mod persistence;
pub mod router;
pub mod scheduler;
pub mod sequencer;
pub mod voice;

// Re-export commonly used types for convenience
pub use config::{ConfigError, Settings};
pub use menu::{MenuEdit, MenuError, MenuState};
pub use midi::{MidiMessage, MidiPort, MidiPorts};
pub use persistence::{PersistenceError, SlotKind, Snapshot, Storage};
pub use router::{EventSource, RouterCommand};
pub use scheduler::{AppContext, ControlSource, Scheduler, TouchSource};
pub use sequencer::{Pattern, SequencerClock, SequencerError, StepResolution, Track};
pub use voice::{Voice, VoiceBank, VoiceParams};
