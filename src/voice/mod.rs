// Voice - Capability consumed from the synthesis engine
// The core never renders audio; it only presses and releases voices by slot.

pub mod bank;

pub use bank::VoiceBank;

use crate::sequencer::SequencerError;
use serde::{Deserialize, Serialize};

/// One percussion voice.
///
/// Calls must not block. Releasing an idle voice is allowed and does nothing.
pub trait Voice {
    /// Start the voice at a velocity in 0.0..=1.0
    fn press(&mut self, velocity: f32);

    /// Stop (or begin the release of) the voice
    fn release(&mut self);

    /// Take new sound parameters. Voices without tweakable parameters ignore this.
    fn apply_params(&mut self, _params: &VoiceParams) {}
}

/// Sound parameters of one voice, as edited from the menu
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    /// Output level (0.0 to 1.0)
    pub amplitude: f32,
    /// Stereo position (-1.0 left to 1.0 right)
    pub pan: f32,
    /// Tuning offset in semitones (-12 to 12)
    pub tune: i8,
    /// Envelope attack level (0.0 to 1.0)
    pub attack_level: f32,
    /// Relative decay time (-1.0 to 1.0)
    pub decay_time: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            pan: 0.0,
            tune: 0,
            attack_level: 1.0,
            decay_time: 0.0,
        }
    }
}

/// A single parameter change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceParam {
    Amplitude(f32),
    Pan(f32),
    Tune(i8),
    AttackLevel(f32),
    DecayTime(f32),
}

impl VoiceParams {
    /// Apply one change, rejecting values outside the parameter's domain
    pub fn set(&mut self, param: VoiceParam) -> Result<(), SequencerError> {
        let mut updated = *self;
        match param {
            VoiceParam::Amplitude(value) => updated.amplitude = value,
            VoiceParam::Pan(value) => updated.pan = value,
            VoiceParam::Tune(value) => updated.tune = value,
            VoiceParam::AttackLevel(value) => updated.attack_level = value,
            VoiceParam::DecayTime(value) => updated.decay_time = value,
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SequencerError> {
        let in_range = |value: f32, min: f32, max: f32| value.is_finite() && value >= min && value <= max;

        if !in_range(self.amplitude, 0.0, 1.0) {
            return Err(invalid("amplitude", self.amplitude));
        }
        if !in_range(self.pan, -1.0, 1.0) {
            return Err(invalid("pan", self.pan));
        }
        if !(-12..=12).contains(&self.tune) {
            return Err(invalid("tune", self.tune as f32));
        }
        if !in_range(self.attack_level, 0.0, 1.0) {
            return Err(invalid("attack level", self.attack_level));
        }
        if !in_range(self.decay_time, -1.0, 1.0) {
            return Err(invalid("decay time", self.decay_time));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: f32) -> SequencerError {
    SequencerError::InvalidParameter(format!("{} {} out of range", name, value))
}

/// Voice that only reports what it is asked to do.
/// Used when no synthesis engine is attached.
pub struct LoggingVoice {
    name: &'static str,
}

impl LoggingVoice {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Voice for LoggingVoice {
    fn press(&mut self, velocity: f32) {
        log::debug!("{} press {:.2}", self.name, velocity);
    }

    fn release(&mut self) {
        log::debug!("{} release", self.name);
    }

    fn apply_params(&mut self, params: &VoiceParams) {
        log::debug!("{} params {:?}", self.name, params);
    }
}
