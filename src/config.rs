// Settings - process-wide policy loaded from a JSON file

use crate::sequencer::resolution::shortest_tick_interval;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Runtime settings.
///
/// Channels are 0-based. `midi_channel` is both the input filter and the
/// channel used for mirrored output; `None` accepts every channel and sends
/// on channel 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub midi_channel: Option<u8>,
    /// Echo recognized incoming messages to both outputs
    pub midi_thru: bool,
    /// Allow the touch pads to edit the focused track
    pub keyboard_touch: bool,
    /// Most messages drained from one input port per scheduling pass
    pub midi_batch_limit: usize,
    pub poll_interval_ms: u64,
    /// Velocity of notes played by the clock
    pub step_velocity: f32,
    /// Fraction of a step a clock note is held before release
    pub gate: f32,
    pub storage_dir: Option<PathBuf>,
    /// Substring of the midir port name used as the USB transport
    pub usb_port: Option<String>,
    /// Substring of the midir port name used as the serial transport
    pub uart_port: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            midi_channel: None,
            midi_thru: false,
            keyboard_touch: true,
            midi_batch_limit: 32,
            poll_interval_ms: 2,
            step_velocity: 1.0,
            gate: 0.5,
            storage_dir: None,
            usb_port: None,
            uart_port: None,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults when the file
    /// does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Default settings location under the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("drum_machine").join("settings.json"))
    }

    /// Directory holding saved slots
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("drum_machine")
        })
    }

    /// Channel used for outgoing messages
    pub fn output_channel(&self) -> u8 {
        self.midi_channel.unwrap_or(0)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(channel) = self.midi_channel {
            if channel > 15 {
                return Err(ConfigError::Invalid(format!(
                    "MIDI channel {} must be between 0 and 15",
                    channel
                )));
            }
        }

        if self.midi_batch_limit == 0 {
            return Err(ConfigError::Invalid(
                "MIDI batch limit must be at least 1".to_string(),
            ));
        }

        // Timing accuracy is bounded by the poll interval
        let max_poll = shortest_tick_interval() / 4;
        if self.poll_interval_ms == 0 || self.poll_interval() > max_poll {
            return Err(ConfigError::Invalid(format!(
                "Poll interval {}ms must be between 1ms and {:?}",
                self.poll_interval_ms, max_poll
            )));
        }

        if !(0.0..=1.0).contains(&self.step_velocity) {
            return Err(ConfigError::Invalid(format!(
                "Step velocity {} must be between 0.0 and 1.0",
                self.step_velocity
            )));
        }

        if !(self.gate > 0.0 && self.gate < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "Gate {} must be strictly between 0.0 and 1.0",
                self.gate
            )));
        }

        Ok(())
    }
}
