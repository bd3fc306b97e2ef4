// Event router - central dispatcher for touch, MIDI-in, clock and menu events
//
// Every source is normalized to a RouterCommand and applied here, fully
// (pattern mutation, voice call, MIDI mirror) before the caller moves on.

pub mod command;

pub use command::{EventSource, RouterCommand};

use crate::midi::{MidiMessage, PortId, velocity_from_midi, velocity_to_midi};
use crate::scheduler::AppContext;
use crate::sequencer::{ClockOutput, SequencerError, Track};

/// Apply one command
pub fn dispatch(
    ctx: &mut AppContext,
    source: EventSource,
    command: RouterCommand,
) -> Result<(), SequencerError> {
    log::debug!("{:?} -> {:?}", source, command);
    match command {
        RouterCommand::TriggerVoice { track, velocity } => {
            trigger(ctx, source, track, velocity);
            Ok(())
        }
        RouterCommand::ReleaseVoice { track } => {
            release(ctx, source, track);
            Ok(())
        }
        RouterCommand::SetPatternNote {
            track,
            position,
            on,
        } => {
            if on {
                ctx.pattern
                    .set_note(track.index(), position, track.note_number())
            } else {
                ctx.pattern.remove_note(track.index(), position)
            }
        }
    }
}

fn trigger(ctx: &mut AppContext, source: EventSource, track: Track, velocity: f32) {
    ctx.voices.press(track, velocity);

    if source.mirrors_to_midi() {
        let message = MidiMessage::note_on(
            ctx.settings.output_channel(),
            track.note_number(),
            velocity_to_midi(velocity),
        );
        ctx.midi.send_all(&message);
    }
}

fn release(ctx: &mut AppContext, source: EventSource, track: Track) {
    // Closing the hat silences a ringing open hat first
    if track == Track::CLOSED_HAT {
        ctx.voices.release(Track::OPEN_HAT);
    }
    ctx.voices.release(track);

    if source.mirrors_to_midi() {
        let message = MidiMessage::note_off(ctx.settings.output_channel(), track.note_number());
        ctx.midi.send_all(&message);
    }
}

/// Apply one clock check: releases first, then the step's triggers
pub fn apply_clock(ctx: &mut AppContext, output: ClockOutput) {
    for track in output.releases.iter() {
        release(ctx, EventSource::Clock, track);
    }

    if let Some(event) = output.step {
        log::trace!("Step {} ({} notes)", event.step, event.triggers.len());
        let velocity = ctx.settings.step_velocity;
        for track in event.triggers.iter() {
            trigger(ctx, EventSource::Clock, track, velocity);
        }
    }
}

/// Process one incoming MIDI message.
///
/// Recognized messages are echoed to both outputs when thru is on, before
/// the channel filter. Messages on another channel are then dropped. A
/// Note-On with velocity 0 releases.
pub fn handle_midi(ctx: &mut AppContext, message: MidiMessage) {
    if ctx.settings.midi_thru && message.is_recognized() {
        ctx.midi.send_all(&message);
    }

    if let Some(channel) = ctx.settings.midi_channel {
        if message.channel() != Some(channel) {
            return;
        }
    }

    let command = match message {
        MidiMessage::NoteOn { note, velocity, .. } if velocity > 0 => {
            RouterCommand::trigger_note(note, velocity_from_midi(velocity))
        }
        MidiMessage::NoteOn { note, .. } | MidiMessage::NoteOff { note, .. } => {
            RouterCommand::release_note(note)
        }
        _ => return,
    };

    // Voice commands cannot fail
    let _ = dispatch(ctx, EventSource::MidiIn, command);
}

/// Drain at most `limit` queued messages from one input port.
/// Whatever is left stays queued for the next pass.
pub fn drain_midi(ctx: &mut AppContext, port: PortId, limit: usize) -> usize {
    let mut processed = 0;
    while processed < limit {
        let Some(message) = ctx.midi.port_mut(port).receive() else {
            break;
        };
        handle_midi(ctx, message);
        processed += 1;
    }
    processed
}

/// Touch pad press at `position`.
///
/// Toggles the focused track's step at `position mod length`. Only a pattern
/// edit: no voice is played and no MIDI is sent. Does nothing unless touch
/// editing is enabled and the menu has a track focused.
pub fn handle_touch(ctx: &mut AppContext, position: usize) -> Option<RouterCommand> {
    if !ctx.settings.keyboard_touch {
        return None;
    }
    let track = ctx.menu.focused_track()?;

    let position = position % ctx.pattern.length();
    let on = !ctx.pattern.has_note(track.index(), position).ok()?;
    let command = RouterCommand::SetPatternNote {
        track,
        position,
        on,
    };

    match dispatch(ctx, EventSource::Touch, command) {
        Ok(()) => Some(command),
        Err(e) => {
            log::warn!("Touch edit rejected: {}", e);
            None
        }
    }
}
