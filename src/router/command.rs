// Router commands - every event source is normalized to one of these

use crate::sequencer::Track;

/// Where an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Touch,
    MidiIn,
    Clock,
    Menu,
}

impl EventSource {
    /// Whether voice commands from this source are echoed as outgoing MIDI.
    /// Incoming MIDI is never looped back out.
    pub fn mirrors_to_midi(self) -> bool {
        matches!(self, EventSource::Clock | EventSource::Touch)
    }
}

/// Normalized command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouterCommand {
    TriggerVoice { track: Track, velocity: f32 },
    ReleaseVoice { track: Track },
    SetPatternNote { track: Track, position: usize, on: bool },
}

impl RouterCommand {
    /// Trigger for a note number, resolved to its track
    pub fn trigger_note(note: u8, velocity: f32) -> Self {
        RouterCommand::TriggerVoice {
            track: Track::from_note(note),
            velocity,
        }
    }

    /// Release for a note number, resolved to its track
    pub fn release_note(note: u8) -> Self {
        RouterCommand::ReleaseVoice {
            track: Track::from_note(note),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirroring_policy() {
        assert!(EventSource::Clock.mirrors_to_midi());
        assert!(EventSource::Touch.mirrors_to_midi());
        assert!(!EventSource::MidiIn.mirrors_to_midi());
        assert!(!EventSource::Menu.mirrors_to_midi());
    }

    #[test]
    fn test_note_resolution() {
        assert_eq!(
            RouterCommand::release_note(12),
            RouterCommand::ReleaseVoice {
                track: Track::CLOSED_HAT
            }
        );
    }
}
