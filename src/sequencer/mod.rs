// Sequencer module
// Step grid, tick clock, and the track identities they share

pub mod clock;
pub mod pattern;
pub mod resolution;
pub mod track;

pub use clock::{ClockOutput, ClockState, SequencerClock, StepEvent};
pub use pattern::{MAX_LENGTH, Pattern, StepGrid};
pub use resolution::{MAX_BPM, MIN_BPM, StepResolution};
pub use track::{TRACK_COUNT, Track, TrackSet};

/// Errors raised at the pattern/clock mutation boundary.
/// A rejected call never changes state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencerError {
    #[error("{what} {index} out of range (bound {bound})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
