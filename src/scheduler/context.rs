// Application context - all live state, constructed once at startup

use crate::config::Settings;
use crate::menu::MenuState;
use crate::midi::MidiPorts;
use crate::persistence::Storage;
use crate::sequencer::{Pattern, SequencerClock, TRACK_COUNT};
use crate::voice::{VoiceBank, VoiceParams};

/// Everything the router, menu dispatch and scheduling loop operate on.
///
/// Lives for the whole process and is passed by reference; nothing in it is
/// shared across threads.
pub struct AppContext {
    pub settings: Settings,
    pub pattern: Pattern,
    pub clock: SequencerClock,
    pub voices: VoiceBank,
    /// Parameters last pushed to each voice
    pub voice_params: [VoiceParams; TRACK_COUNT],
    pub midi: MidiPorts,
    pub menu: MenuState,
    pub storage: Box<dyn Storage>,
}

impl AppContext {
    /// Build the context with a default pattern and a stopped clock, then
    /// push the initial parameters to every voice
    pub fn new(
        settings: Settings,
        voices: VoiceBank,
        midi: MidiPorts,
        storage: Box<dyn Storage>,
    ) -> Self {
        let clock = SequencerClock::new().with_gate(settings.gate);
        let mut context = Self {
            settings,
            pattern: Pattern::default(),
            clock,
            voices,
            voice_params: [VoiceParams::default(); TRACK_COUNT],
            midi,
            menu: MenuState::default(),
            storage,
        };
        context.voices.apply_all(&context.voice_params);
        context
    }
}
