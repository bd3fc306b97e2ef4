// Slot records - versioned, fixed-layout snapshots encoded as RON

use super::{PersistenceError, SlotKind};
use crate::sequencer::pattern::{MAX_LENGTH, Pattern, StepGrid};
use crate::sequencer::resolution::{StepResolution, validate_bpm};
use crate::sequencer::track::{TRACK_COUNT, Track};
use crate::sequencer::SequencerClock;
use crate::voice::VoiceParams;
use chrono::{DateTime, Utc};
use ron::{from_str as ron_from_str, to_string as ron_to_string};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Layout version written by this build. Readers reject any other version.
pub const RECORD_VERSION: u32 = 1;

/// Tempo, resolution, length and every step of the pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSnapshot {
    pub bpm: u16,
    pub resolution: StepResolution,
    pub length: u8,
    pub steps: StepGrid,
}

impl PatternSnapshot {
    /// Copy the live pattern and clock parameters
    pub fn capture(pattern: &Pattern, clock: &SequencerClock) -> Self {
        Self {
            bpm: clock.bpm(),
            resolution: clock.resolution(),
            length: pattern.length() as u8,
            steps: *pattern.grid(),
        }
    }

    /// Rebuild the pattern. Fails if the snapshot breaks a pattern invariant.
    pub fn to_pattern(&self) -> Result<Pattern, PersistenceError> {
        Pattern::from_grid(self.steps, self.length as usize)
            .map_err(|e| PersistenceError::CorruptRecord(e.to_string()))
    }

    fn validate(&self) -> Result<(), PersistenceError> {
        validate_bpm(self.bpm).map_err(|e| PersistenceError::CorruptRecord(e.to_string()))?;

        let length = self.length as usize;
        if !(1..=MAX_LENGTH).contains(&length) {
            return Err(PersistenceError::CorruptRecord(format!(
                "pattern length {}",
                length
            )));
        }

        for track in Track::all() {
            for (position, cell) in self.steps[track.index()].iter().enumerate() {
                match cell {
                    Some(note) if *note != track.note_number() => {
                        return Err(PersistenceError::CorruptRecord(format!(
                            "note {} stored on track {}",
                            note, track
                        )));
                    }
                    Some(_) if position >= length => {
                        return Err(PersistenceError::CorruptRecord(format!(
                            "note beyond pattern length at {}",
                            position
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// Parameter set of every voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfigSnapshot {
    pub voices: [VoiceParams; TRACK_COUNT],
}

impl VoiceConfigSnapshot {
    fn validate(&self) -> Result<(), PersistenceError> {
        for params in &self.voices {
            params
                .validate()
                .map_err(|e| PersistenceError::CorruptRecord(e.to_string()))?;
        }
        Ok(())
    }
}

impl Default for VoiceConfigSnapshot {
    fn default() -> Self {
        Self {
            voices: [VoiceParams::default(); TRACK_COUNT],
        }
    }
}

/// Anything that can be stored in a slot
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Pattern(PatternSnapshot),
    VoiceConfig(VoiceConfigSnapshot),
}

impl Snapshot {
    pub fn kind(&self) -> SlotKind {
        match self {
            Snapshot::Pattern(_) => SlotKind::Pattern,
            Snapshot::VoiceConfig(_) => SlotKind::VoiceConfig,
        }
    }
}

/// On-disk envelope around a snapshot
#[derive(Debug, Serialize, Deserialize)]
struct SlotRecord<T> {
    format: String,
    version: u32,
    saved_at: DateTime<Utc>,
    payload: T,
}

/// Encode a snapshot into the bytes stored for its kind
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, PersistenceError> {
    let kind = snapshot.kind();
    let text = match snapshot {
        Snapshot::Pattern(payload) => encode_payload(kind, payload)?,
        Snapshot::VoiceConfig(payload) => encode_payload(kind, payload)?,
    };
    Ok(text.into_bytes())
}

/// Decode stored bytes, checking the format tag and version for `kind`
pub fn decode(kind: SlotKind, bytes: &[u8]) -> Result<Snapshot, PersistenceError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| PersistenceError::CorruptRecord(format!("not UTF-8: {}", e)))?;

    match kind {
        SlotKind::Pattern => {
            let payload: PatternSnapshot = decode_payload(kind, text)?;
            payload.validate()?;
            Ok(Snapshot::Pattern(payload))
        }
        SlotKind::VoiceConfig => {
            let payload: VoiceConfigSnapshot = decode_payload(kind, text)?;
            payload.validate()?;
            Ok(Snapshot::VoiceConfig(payload))
        }
    }
}

fn encode_payload<T: Serialize>(kind: SlotKind, payload: &T) -> Result<String, PersistenceError> {
    let record = SlotRecord {
        format: kind.format_tag().to_string(),
        version: RECORD_VERSION,
        saved_at: Utc::now(),
        payload,
    };
    Ok(ron_to_string(&record)?)
}

fn decode_payload<T: DeserializeOwned>(kind: SlotKind, text: &str) -> Result<T, PersistenceError> {
    let record: SlotRecord<T> = ron_from_str(text)
        .map_err(|e| PersistenceError::CorruptRecord(format!("unreadable record: {}", e)))?;

    if record.format != kind.format_tag() {
        return Err(PersistenceError::CorruptRecord(format!(
            "expected format '{}', found '{}'",
            kind.format_tag(),
            record.format
        )));
    }
    if record.version != RECORD_VERSION {
        return Err(PersistenceError::CorruptRecord(format!(
            "unsupported record version {} (expected {})",
            record.version, RECORD_VERSION
        )));
    }

    log::debug!("Decoded {} record saved at {}", kind, record.saved_at);
    Ok(record.payload)
}
