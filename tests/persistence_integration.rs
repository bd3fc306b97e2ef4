// Integration test for slot persistence
// Save and load through the menu against both storage backends, including
// files on disk that have been damaged after saving.

mod common;

use common::Rig;
use drum_machine::persistence::{self, FileStorage, MemoryStorage, SlotKind, Storage};
use drum_machine::sequencer::StepResolution;
use drum_machine::{MenuEdit, MenuError, PersistenceError, Settings, menu};
use tempfile::TempDir;

fn program_pattern(rig: &mut Rig) {
    menu::apply(&mut rig.context, MenuEdit::SetBpm(96)).unwrap();
    menu::apply(&mut rig.context, MenuEdit::SetResolution(3)).unwrap();
    menu::apply(&mut rig.context, MenuEdit::SetLength(12)).unwrap();
    for (track, position) in [(0, 0), (1, 4), (3, 2), (3, 10), (7, 11)] {
        menu::apply(&mut rig.context, MenuEdit::SetNote { track, position }).unwrap();
    }
}

fn assert_round_trip(mut rig: Rig) {
    program_pattern(&mut rig);
    let saved = rig.context.pattern.clone();

    menu::apply(&mut rig.context, MenuEdit::SavePattern(5)).unwrap();

    // Scramble the live state
    menu::apply(&mut rig.context, MenuEdit::SetBpm(180)).unwrap();
    menu::apply(&mut rig.context, MenuEdit::SetResolution(0)).unwrap();
    menu::apply(&mut rig.context, MenuEdit::SetLength(16)).unwrap();
    rig.context.pattern.set_note(6, 14, 7).unwrap();

    menu::apply(&mut rig.context, MenuEdit::LoadPattern(5)).unwrap();

    assert_eq!(rig.context.pattern, saved);
    assert_eq!(rig.context.clock.bpm(), 96);
    assert_eq!(rig.context.clock.resolution(), StepResolution::Eighth);
    assert_eq!(rig.context.menu.pattern_slot, 5);
}

#[test]
fn test_round_trip_memory_storage() {
    assert_round_trip(Rig::new(Settings::default()));
}

#[test]
fn test_round_trip_file_storage() {
    let dir = TempDir::new().unwrap();
    let rig = Rig::with_storage(Settings::default(), Box::new(FileStorage::new(dir.path())));
    assert_round_trip(rig);

    assert!(dir.path().join("pattern").join("05.ron").exists());
}

#[test]
fn test_saved_slot_survives_restart() {
    let dir = TempDir::new().unwrap();

    let mut first = Rig::with_storage(Settings::default(), Box::new(FileStorage::new(dir.path())));
    program_pattern(&mut first);
    let saved = first.context.pattern.clone();
    menu::apply(&mut first.context, MenuEdit::SavePattern(0)).unwrap();
    drop(first);

    let mut second = Rig::with_storage(Settings::default(), Box::new(FileStorage::new(dir.path())));
    menu::restore_slots(&mut second.context);

    assert_eq!(second.context.pattern, saved);
    assert_eq!(second.context.clock.bpm(), 96);
}

#[test]
fn test_restore_with_empty_storage_keeps_defaults() {
    let mut rig = Rig::new(Settings::default());
    menu::restore_slots(&mut rig.context);

    assert_eq!(rig.context.pattern.length(), 16);
    assert_eq!(rig.context.pattern.note_count(), 0);
    assert_eq!(rig.context.clock.bpm(), 120);
}

#[test]
fn test_never_saved_slot_leaves_state() {
    let mut rig = Rig::new(Settings::default());
    program_pattern(&mut rig);
    let before = rig.context.pattern.clone();

    let result = menu::apply(&mut rig.context, MenuEdit::LoadPattern(11));

    assert!(matches!(
        result,
        Err(MenuError::Persistence(PersistenceError::SlotEmpty(11)))
    ));
    assert_eq!(rig.context.pattern, before);
    assert_eq!(rig.context.clock.bpm(), 96);
}

#[test]
fn test_load_is_idempotent() {
    let mut rig = Rig::new(Settings::default());
    program_pattern(&mut rig);
    menu::apply(&mut rig.context, MenuEdit::SavePattern(2)).unwrap();

    menu::apply(&mut rig.context, MenuEdit::LoadPattern(2)).unwrap();
    let once = rig.context.pattern.clone();
    menu::apply(&mut rig.context, MenuEdit::LoadPattern(2)).unwrap();

    assert_eq!(rig.context.pattern, once);
}

#[test]
fn test_slot_out_of_range() {
    let mut rig = Rig::new(Settings::default());
    let result = menu::apply(&mut rig.context, MenuEdit::SavePattern(16));
    assert!(matches!(
        result,
        Err(MenuError::Persistence(PersistenceError::OutOfRange(16)))
    ));

    // The bad slot is not remembered, so a restart still restores slot 0
    let result = menu::apply(&mut rig.context, MenuEdit::LoadPattern(200));
    assert!(matches!(
        result,
        Err(MenuError::Persistence(PersistenceError::OutOfRange(200)))
    ));
    assert_eq!(rig.context.menu.pattern_slot, 0);
}

#[test]
fn test_damaged_file_is_corrupt_and_leaves_state() {
    let dir = TempDir::new().unwrap();
    let mut rig = Rig::with_storage(Settings::default(), Box::new(FileStorage::new(dir.path())));
    program_pattern(&mut rig);
    menu::apply(&mut rig.context, MenuEdit::SavePattern(3)).unwrap();

    std::fs::write(dir.path().join("pattern").join("03.ron"), b"(format: \"nope\"").unwrap();

    menu::apply(&mut rig.context, MenuEdit::SetBpm(140)).unwrap();
    let before = rig.context.pattern.clone();
    let result = menu::apply(&mut rig.context, MenuEdit::LoadPattern(3));

    assert!(matches!(
        result,
        Err(MenuError::Persistence(PersistenceError::CorruptRecord(_)))
    ));
    assert_eq!(rig.context.pattern, before);
    assert_eq!(rig.context.clock.bpm(), 140);
}

#[test]
fn test_pattern_and_voice_slots_are_separate() {
    let mut storage = MemoryStorage::new();
    let mut rig = Rig::new(Settings::default());
    program_pattern(&mut rig);

    menu::save_pattern(&mut rig.context, 4).unwrap();
    let snapshot = persistence::load(rig.context.storage.as_ref(), SlotKind::Pattern, 4).unwrap();
    persistence::save(&mut storage, 4, &snapshot).unwrap();

    assert!(storage.load(SlotKind::Pattern.namespace(), 4).unwrap().is_some());
    assert!(matches!(
        persistence::load_voice_config(&storage, 4),
        Err(PersistenceError::SlotEmpty(4))
    ));
}
