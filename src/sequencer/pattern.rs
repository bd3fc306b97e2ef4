// Pattern - Fixed-capacity step grid, one row per track
// Pure data: no I/O and no voice side effects

use super::SequencerError;
use super::track::{TRACK_COUNT, Track, TrackSet};

/// Longest supported pattern, in steps
pub const MAX_LENGTH: usize = 16;

/// Length of a freshly created pattern
pub const DEFAULT_LENGTH: usize = 16;

/// Raw cell storage: `Some(note_number)` where a step holds a note
pub type StepGrid = [[Option<u8>; MAX_LENGTH]; TRACK_COUNT];

/// Step grid shared by every track
///
/// All tracks have the same `length` (1..=MAX_LENGTH). Cells at or beyond the
/// current length are always empty, so shrinking then growing the pattern
/// never resurrects discarded notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    cells: StepGrid,
    length: usize,
}

impl Pattern {
    /// Create an empty pattern of the given length
    pub fn new(length: usize) -> Result<Self, SequencerError> {
        validate_length(length)?;
        Ok(Self {
            cells: [[None; MAX_LENGTH]; TRACK_COUNT],
            length,
        })
    }

    /// Rebuild a pattern from stored cells, dropping anything past `length`
    pub fn from_grid(cells: StepGrid, length: usize) -> Result<Self, SequencerError> {
        let mut pattern = Self::new(length)?;
        for track in Track::all() {
            for position in 0..length {
                if let Some(note) = cells[track.index()][position] {
                    pattern.set_note(track.index(), position, note)?;
                }
            }
        }
        Ok(pattern)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn grid(&self) -> &StepGrid {
        &self.cells
    }

    /// Check whether a step holds a note
    pub fn has_note(&self, track: usize, position: usize) -> Result<bool, SequencerError> {
        Ok(self.note_number(track, position)?.is_some())
    }

    /// Note number stored at a step, if any
    pub fn note_number(&self, track: usize, position: usize) -> Result<Option<u8>, SequencerError> {
        let track = self.check_bounds(track, position)?;
        Ok(self.cells[track.index()][position])
    }

    /// Place a note at a step, overwriting whatever was there.
    ///
    /// The note number must be the one bound to the track (`track + 1`).
    pub fn set_note(
        &mut self,
        track: usize,
        position: usize,
        note_number: u8,
    ) -> Result<(), SequencerError> {
        let track = self.check_bounds(track, position)?;
        if note_number != track.note_number() {
            return Err(SequencerError::InvalidParameter(format!(
                "note {} does not belong to track {}",
                note_number, track
            )));
        }
        self.cells[track.index()][position] = Some(note_number);
        Ok(())
    }

    /// Remove the note at a step; a no-op when the step is already empty
    pub fn remove_note(&mut self, track: usize, position: usize) -> Result<(), SequencerError> {
        let track = self.check_bounds(track, position)?;
        self.cells[track.index()][position] = None;
        Ok(())
    }

    /// Change the length of every track.
    ///
    /// Notes at positions `>= length` are discarded and do not come back if the
    /// pattern is lengthened again.
    pub fn resize(&mut self, length: usize) -> Result<(), SequencerError> {
        validate_length(length)?;
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut().skip(length) {
                *cell = None;
            }
        }
        self.length = length;
        Ok(())
    }

    /// Tracks that hold a note at the given position
    pub fn notes_at(&self, position: usize) -> TrackSet {
        if position >= self.length {
            return TrackSet::empty();
        }
        Track::all()
            .filter(|track| self.cells[track.index()][position].is_some())
            .collect()
    }

    /// Note presence for one track, as a grid editor would show it
    pub fn track_steps(&self, track: Track) -> [bool; MAX_LENGTH] {
        self.cells[track.index()].map(|cell| cell.is_some())
    }

    /// Remove every note, keeping the length
    pub fn clear(&mut self) {
        self.cells = [[None; MAX_LENGTH]; TRACK_COUNT];
    }

    pub fn note_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| cell.is_some())
            .count()
    }

    fn check_bounds(&self, track: usize, position: usize) -> Result<Track, SequencerError> {
        let resolved = Track::new(track).ok_or(SequencerError::OutOfRange {
            what: "track",
            index: track,
            bound: TRACK_COUNT,
        })?;
        if position >= self.length {
            return Err(SequencerError::OutOfRange {
                what: "position",
                index: position,
                bound: self.length,
            });
        }
        Ok(resolved)
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            cells: [[None; MAX_LENGTH]; TRACK_COUNT],
            length: DEFAULT_LENGTH,
        }
    }
}

fn validate_length(length: usize) -> Result<(), SequencerError> {
    if (1..=MAX_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(SequencerError::InvalidParameter(format!(
            "pattern length {} outside 1..={}",
            length, MAX_LENGTH
        )))
    }
}
