// Track - Voice slot identity and note number mapping

use std::fmt;

/// Number of percussion voices (and pattern tracks)
pub const TRACK_COUNT: usize = 8;

/// Display names, indexed by track
const TRACK_NAMES: [&str; TRACK_COUNT] = [
    "Kick",
    "Snare",
    "Floor Tom",
    "Closed Hat",
    "Open Hat",
    "Mid Tom",
    "High Tom",
    "Ride",
];

/// One of the fixed voice slots. The index is the sole identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Track(u8);

impl Track {
    /// Closing this hat chokes the open hat
    pub const CLOSED_HAT: Track = Track(3);
    pub const OPEN_HAT: Track = Track(4);

    /// Create a track from an index, `None` when outside 0..TRACK_COUNT
    pub fn new(index: usize) -> Option<Self> {
        (index < TRACK_COUNT).then_some(Track(index as u8))
    }

    /// Resolve a note number to its track: `(n - 1) mod TRACK_COUNT`.
    ///
    /// Note numbers wrap across the voices, so `n` and `n + 8` land on the
    /// same track. Note 0 wraps to the last track.
    pub fn from_note(note: u8) -> Self {
        let index = (note as i32 - 1).rem_euclid(TRACK_COUNT as i32);
        Track(index as u8)
    }

    /// Track for an index taken modulo TRACK_COUNT
    pub fn wrapping(index: usize) -> Self {
        Track((index % TRACK_COUNT) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// MIDI note number bound to this track (index + 1)
    pub fn note_number(self) -> u8 {
        self.0 + 1
    }

    pub fn name(self) -> &'static str {
        TRACK_NAMES[self.index()]
    }

    /// Iterate every track in index order
    pub fn all() -> impl Iterator<Item = Track> {
        (0..TRACK_COUNT as u8).map(Track)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

/// Fixed-capacity set of tracks, stored as a bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackSet(u8);

impl TrackSet {
    pub const fn empty() -> Self {
        TrackSet(0)
    }

    pub fn insert(&mut self, track: Track) {
        self.0 |= 1 << track.0;
    }

    pub fn contains(&self, track: Track) -> bool {
        self.0 & (1 << track.0) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Take the current contents, leaving the set empty
    pub fn take(&mut self) -> TrackSet {
        std::mem::take(self)
    }

    /// Tracks in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = Track> + '_ {
        Track::all().filter(move |track| self.contains(*track))
    }
}

impl FromIterator<Track> for TrackSet {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        let mut set = TrackSet::empty();
        for track in iter {
            set.insert(track);
        }
        set
    }
}
