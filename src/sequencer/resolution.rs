// Step resolution - Subdivision of a beat that one pattern step spans

use super::SequencerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Slowest supported tempo
pub const MIN_BPM: u16 = 60;

/// Fastest supported tempo
pub const MAX_BPM: u16 = 240;

pub const DEFAULT_BPM: u16 = 120;

/// Note value of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StepResolution {
    Whole,
    Half,
    Quarter,
    Eighth,
    EighthTriplet,
    #[default]
    Sixteenth,
    ThirtySecond,
}

impl StepResolution {
    /// Every resolution, in the order the menu lists them
    pub const ALL: [StepResolution; 7] = [
        StepResolution::Whole,
        StepResolution::Half,
        StepResolution::Quarter,
        StepResolution::Eighth,
        StepResolution::EighthTriplet,
        StepResolution::Sixteenth,
        StepResolution::ThirtySecond,
    ];

    /// Look up a resolution by its menu list index
    pub fn from_index(index: usize) -> Result<Self, SequencerError> {
        Self::ALL.get(index).copied().ok_or_else(|| {
            SequencerError::InvalidParameter(format!("resolution index {} out of range", index))
        })
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|resolution| *resolution == self)
            .unwrap_or_default()
    }

    /// How many steps fit in one quarter-note beat
    pub fn steps_per_beat(self) -> f64 {
        match self {
            StepResolution::Whole => 0.25,
            StepResolution::Half => 0.5,
            StepResolution::Quarter => 1.0,
            StepResolution::Eighth => 2.0,
            StepResolution::EighthTriplet => 3.0,
            StepResolution::Sixteenth => 4.0,
            StepResolution::ThirtySecond => 8.0,
        }
    }

    /// Time between two ticks: `60 / (bpm * steps_per_beat)` seconds
    pub fn tick_interval(self, bpm: u16) -> Duration {
        Duration::from_secs_f64(60.0 / (bpm as f64 * self.steps_per_beat()))
    }

    pub fn label(self) -> &'static str {
        match self {
            StepResolution::Whole => "Whole",
            StepResolution::Half => "Half",
            StepResolution::Quarter => "Quarter",
            StepResolution::Eighth => "Eighth",
            StepResolution::EighthTriplet => "Triplet",
            StepResolution::Sixteenth => "Sixteenth",
            StepResolution::ThirtySecond => "Thirty-second",
        }
    }
}

impl fmt::Display for StepResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reject tempos outside MIN_BPM..=MAX_BPM
pub fn validate_bpm(bpm: u16) -> Result<u16, SequencerError> {
    if (MIN_BPM..=MAX_BPM).contains(&bpm) {
        Ok(bpm)
    } else {
        Err(SequencerError::InvalidParameter(format!(
            "tempo {} BPM outside {}..={}",
            bpm, MIN_BPM, MAX_BPM
        )))
    }
}

/// Shortest tick the clock can produce (fastest tempo, finest resolution)
pub fn shortest_tick_interval() -> Duration {
    StepResolution::ThirtySecond.tick_interval(MAX_BPM)
}
