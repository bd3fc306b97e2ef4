// Voice bank - The fixed binding of tracks to voices

use super::{Voice, VoiceParams};
use crate::sequencer::track::{TRACK_COUNT, Track};

/// Exactly one voice per track, fixed at startup.
/// Track `i` answers to MIDI note `i + 1`.
pub struct VoiceBank {
    voices: [Box<dyn Voice>; TRACK_COUNT],
}

impl VoiceBank {
    pub fn new(voices: [Box<dyn Voice>; TRACK_COUNT]) -> Self {
        Self { voices }
    }

    /// Build the bank by calling `make` once per track
    pub fn from_fn(mut make: impl FnMut(Track) -> Box<dyn Voice>) -> Self {
        let voices = std::array::from_fn(|index| make(Track::wrapping(index)));
        Self { voices }
    }

    pub fn press(&mut self, track: Track, velocity: f32) {
        self.voices[track.index()].press(velocity.clamp(0.0, 1.0));
    }

    pub fn release(&mut self, track: Track) {
        self.voices[track.index()].release();
    }

    pub fn apply_params(&mut self, track: Track, params: &VoiceParams) {
        self.voices[track.index()].apply_params(params);
    }

    /// Push a full parameter set to every voice
    pub fn apply_all(&mut self, params: &[VoiceParams; TRACK_COUNT]) {
        for track in Track::all() {
            self.apply_params(track, &params[track.index()]);
        }
    }
}
