// Persistence adapter - saves and loads numbered slots
// A pure transcoding boundary: it never touches live pattern or clock state.

pub mod record;
pub mod storage;

pub use record::{PatternSnapshot, RECORD_VERSION, Snapshot, VoiceConfigSnapshot};
pub use storage::{FileStorage, MemoryStorage, Storage};

use std::fmt;

/// Number of slots per kind (ids 0..SLOT_COUNT)
pub const SLOT_COUNT: u8 = 16;

/// Persistence error types
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Slot {0} is empty")]
    SlotEmpty(u8),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Slot {0} out of range")]
    OutOfRange(u8),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

/// What a slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Pattern,
    VoiceConfig,
}

impl SlotKind {
    /// Storage namespace for this kind
    pub fn namespace(self) -> &'static str {
        match self {
            SlotKind::Pattern => "pattern",
            SlotKind::VoiceConfig => "voice",
        }
    }

    /// Tag written inside every record of this kind
    pub fn format_tag(self) -> &'static str {
        match self {
            SlotKind::Pattern => "drum_machine.pattern",
            SlotKind::VoiceConfig => "drum_machine.voice-config",
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

fn check_slot(slot: u8) -> Result<(), PersistenceError> {
    if slot < SLOT_COUNT {
        Ok(())
    } else {
        Err(PersistenceError::OutOfRange(slot))
    }
}

/// Write a snapshot to a slot of its kind, replacing whatever was there
pub fn save(
    storage: &mut dyn Storage,
    slot: u8,
    snapshot: &Snapshot,
) -> Result<(), PersistenceError> {
    check_slot(slot)?;
    let kind = snapshot.kind();
    let bytes = record::encode(snapshot)?;
    storage.save(kind.namespace(), slot, &bytes)?;
    log::info!("Saved {} slot {}", kind, slot);
    Ok(())
}

/// Read a snapshot back from a slot
pub fn load(storage: &dyn Storage, kind: SlotKind, slot: u8) -> Result<Snapshot, PersistenceError> {
    check_slot(slot)?;
    let bytes = storage
        .load(kind.namespace(), slot)?
        .ok_or(PersistenceError::SlotEmpty(slot))?;
    record::decode(kind, &bytes)
}

/// Typed shortcut for pattern slots
pub fn load_pattern(storage: &dyn Storage, slot: u8) -> Result<PatternSnapshot, PersistenceError> {
    match load(storage, SlotKind::Pattern, slot)? {
        Snapshot::Pattern(snapshot) => Ok(snapshot),
        Snapshot::VoiceConfig(_) => Err(PersistenceError::CorruptRecord(
            "voice configuration in a pattern slot".to_string(),
        )),
    }
}

/// Typed shortcut for voice-config slots
pub fn load_voice_config(
    storage: &dyn Storage,
    slot: u8,
) -> Result<VoiceConfigSnapshot, PersistenceError> {
    match load(storage, SlotKind::VoiceConfig, slot)? {
        Snapshot::VoiceConfig(snapshot) => Ok(snapshot),
        Snapshot::Pattern(_) => Err(PersistenceError::CorruptRecord(
            "pattern in a voice configuration slot".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::{Pattern, SequencerClock};

    #[test]
    fn test_never_saved_slot_is_empty() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            load(&storage, SlotKind::Pattern, 7),
            Err(PersistenceError::SlotEmpty(7))
        ));
    }

    #[test]
    fn test_slot_out_of_range() {
        let mut storage = MemoryStorage::new();
        let snapshot = Snapshot::VoiceConfig(VoiceConfigSnapshot::default());

        assert!(matches!(
            save(&mut storage, 16, &snapshot),
            Err(PersistenceError::OutOfRange(16))
        ));
        assert!(storage.is_empty());
        assert!(matches!(
            load(&storage, SlotKind::VoiceConfig, 200),
            Err(PersistenceError::OutOfRange(200))
        ));
    }

    #[test]
    fn test_save_overwrites() {
        let mut storage = MemoryStorage::new();
        let mut pattern = Pattern::default();
        let clock = SequencerClock::new();

        pattern.set_note(0, 0, 1).unwrap();
        save(&mut storage, 2, &Snapshot::Pattern(PatternSnapshot::capture(&pattern, &clock))).unwrap();

        pattern.clear();
        pattern.set_note(1, 1, 2).unwrap();
        save(&mut storage, 2, &Snapshot::Pattern(PatternSnapshot::capture(&pattern, &clock))).unwrap();

        let loaded = load_pattern(&storage, 2).unwrap().to_pattern().unwrap();
        assert_eq!(loaded, pattern);
    }

    #[test]
    fn test_kinds_use_separate_namespaces() {
        let mut storage = MemoryStorage::new();
        save(&mut storage, 0, &Snapshot::VoiceConfig(VoiceConfigSnapshot::default())).unwrap();

        assert!(matches!(
            load_pattern(&storage, 0),
            Err(PersistenceError::SlotEmpty(0))
        ));
        assert!(load_voice_config(&storage, 0).is_ok());
    }
}
