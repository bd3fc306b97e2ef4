// Menu dispatch - typed parameter edits from the menu layer
//
// The menu layer renders and navigates; each committed change arrives here as
// a MenuEdit and takes effect immediately on the live state.

use crate::persistence::{self, PatternSnapshot, PersistenceError, Snapshot, VoiceConfigSnapshot};
use crate::router::{self, EventSource, RouterCommand};
use crate::scheduler::AppContext;
use crate::sequencer::{MAX_LENGTH, SequencerError, TRACK_COUNT, Track};
use crate::voice::VoiceParam;

/// Menu errors. The live state is unchanged whenever one is returned.
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error(transparent)]
    Sequencer(#[from] SequencerError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// One committed menu change
#[derive(Debug, Clone, PartialEq)]
pub enum MenuEdit {
    SetActive(bool),
    SetBpm(u16),
    /// Index into the resolution list
    SetResolution(usize),
    SetLength(usize),
    /// New value of a track's grid editor. Entries past the pattern length
    /// are ignored.
    SetTrackSteps {
        track: usize,
        steps: [bool; MAX_LENGTH],
    },
    SetNote {
        track: usize,
        position: usize,
    },
    RemoveNote {
        track: usize,
        position: usize,
    },
    /// Menu selection moved onto a track's grid editor (or away from all of them)
    Focus(Option<usize>),
    SavePattern(u8),
    LoadPattern(u8),
    SetVoiceParam {
        track: usize,
        param: VoiceParam,
    },
    SaveVoiceConfig(u8),
    LoadVoiceConfig(u8),
}

/// Menu-side state the core needs to know about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    focus: Option<Track>,
    /// Slot shown in the pattern group's index field
    pub pattern_slot: u8,
    /// Slot shown in the voice group's index field
    pub voice_slot: u8,
}

impl MenuState {
    /// Track whose grid editor is selected, if any
    pub fn focused_track(&self) -> Option<Track> {
        self.focus
    }

    pub fn focus(&mut self, track: Option<Track>) {
        self.focus = track;
    }
}

/// Apply one menu edit
pub fn apply(ctx: &mut AppContext, edit: MenuEdit) -> Result<(), MenuError> {
    log::debug!("Menu edit {:?}", edit);
    match edit {
        MenuEdit::SetActive(active) => ctx.clock.set_active(active),
        MenuEdit::SetBpm(bpm) => ctx.clock.set_bpm(bpm)?,
        MenuEdit::SetResolution(index) => ctx.clock.set_resolution_index(index)?,
        MenuEdit::SetLength(length) => {
            ctx.pattern.resize(length)?;
            ctx.clock.wrap_to_length(length);
        }
        MenuEdit::SetTrackSteps { track, steps } => set_track_steps(ctx, track, &steps)?,
        MenuEdit::SetNote { track, position } => {
            set_pattern_note(ctx, track, position, true)?;
        }
        MenuEdit::RemoveNote { track, position } => {
            set_pattern_note(ctx, track, position, false)?;
        }
        MenuEdit::Focus(track) => {
            let track = track.map(resolve_track).transpose()?;
            ctx.menu.focus(track);
        }
        MenuEdit::SavePattern(slot) => {
            save_pattern(ctx, slot)?;
            ctx.menu.pattern_slot = slot;
        }
        MenuEdit::LoadPattern(slot) => {
            load_pattern(ctx, slot)?;
            ctx.menu.pattern_slot = slot;
        }
        MenuEdit::SetVoiceParam { track, param } => {
            let track = resolve_track(track)?;
            ctx.voice_params[track.index()].set(param)?;
            ctx.voices
                .apply_params(track, &ctx.voice_params[track.index()]);
        }
        MenuEdit::SaveVoiceConfig(slot) => {
            let snapshot = VoiceConfigSnapshot {
                voices: ctx.voice_params,
            };
            persistence::save(ctx.storage.as_mut(), slot, &Snapshot::VoiceConfig(snapshot))?;
            ctx.menu.voice_slot = slot;
        }
        MenuEdit::LoadVoiceConfig(slot) => {
            let snapshot = persistence::load_voice_config(ctx.storage.as_ref(), slot)
                .inspect_err(|e| log::warn!("Voice config load failed: {}", e))?;
            ctx.voice_params = snapshot.voices;
            ctx.voices.apply_all(&ctx.voice_params);
            ctx.menu.voice_slot = slot;
            log::info!("Loaded voice config slot {}", slot);
        }
    }
    Ok(())
}

/// Load the slots the menu currently points at, as the menu does on startup.
/// Empty slots are skipped; other failures are logged and leave state as is.
pub fn restore_slots(ctx: &mut AppContext) {
    let pattern_slot = ctx.menu.pattern_slot;
    match load_pattern(ctx, pattern_slot) {
        Ok(()) | Err(PersistenceError::SlotEmpty(_)) => {}
        Err(e) => log::warn!("Startup pattern restore failed: {}", e),
    }

    let voice_slot = ctx.menu.voice_slot;
    if let Err(e) = apply(ctx, MenuEdit::LoadVoiceConfig(voice_slot)) {
        if !matches!(e, MenuError::Persistence(PersistenceError::SlotEmpty(_))) {
            log::warn!("Startup voice restore failed: {}", e);
        }
    }
}

/// Store the live pattern, tempo and resolution in a slot
pub fn save_pattern(ctx: &mut AppContext, slot: u8) -> Result<(), PersistenceError> {
    let snapshot = PatternSnapshot::capture(&ctx.pattern, &ctx.clock);
    persistence::save(ctx.storage.as_mut(), slot, &Snapshot::Pattern(snapshot))
}

/// Replace the live pattern, tempo and resolution with a saved slot.
/// On failure nothing changes.
pub fn load_pattern(ctx: &mut AppContext, slot: u8) -> Result<(), PersistenceError> {
    let snapshot = persistence::load_pattern(ctx.storage.as_ref(), slot)
        .inspect_err(|e| log::warn!("Pattern load failed: {}", e))?;
    let pattern = snapshot.to_pattern()?;

    // Validated by the record reader, so these cannot fail
    ctx.clock
        .set_bpm(snapshot.bpm)
        .map_err(|e| PersistenceError::CorruptRecord(e.to_string()))?;
    ctx.clock.set_resolution(snapshot.resolution);
    ctx.clock.wrap_to_length(pattern.length());
    ctx.pattern = pattern;

    log::info!(
        "Loaded pattern slot {} ({} BPM, {}, {} steps)",
        slot,
        snapshot.bpm,
        snapshot.resolution,
        snapshot.length
    );
    Ok(())
}

/// Translate a grid-editor value into one set/remove per changed cell
fn set_track_steps(
    ctx: &mut AppContext,
    track: usize,
    steps: &[bool; MAX_LENGTH],
) -> Result<(), SequencerError> {
    let track = resolve_track(track)?;
    let current = ctx.pattern.track_steps(track);
    let length = ctx.pattern.length();

    for position in 0..length {
        if steps[position] != current[position] {
            router::dispatch(
                ctx,
                EventSource::Menu,
                RouterCommand::SetPatternNote {
                    track,
                    position,
                    on: steps[position],
                },
            )?;
        }
    }
    Ok(())
}

fn set_pattern_note(
    ctx: &mut AppContext,
    track: usize,
    position: usize,
    on: bool,
) -> Result<(), SequencerError> {
    let track = resolve_track(track)?;
    router::dispatch(
        ctx,
        EventSource::Menu,
        RouterCommand::SetPatternNote {
            track,
            position,
            on,
        },
    )
}

fn resolve_track(track: usize) -> Result<Track, SequencerError> {
    Track::new(track).ok_or(SequencerError::OutOfRange {
        what: "track",
        index: track,
        bound: TRACK_COUNT,
    })
}
