// Sequencer clock - Converts elapsed time into step ticks
// Free-running cycle over the pattern while active; silent while stopped

use super::SequencerError;
use super::pattern::Pattern;
use super::resolution::{DEFAULT_BPM, StepResolution, validate_bpm};
use super::track::TrackSet;
use std::time::Duration;

/// Fraction of a step a clock-triggered note is held by default
pub const DEFAULT_GATE: f32 = 0.5;

/// Clock state (running/stopped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    #[default]
    Stopped,
    Running,
}

impl ClockState {
    pub fn is_running(&self) -> bool {
        matches!(self, ClockState::Running)
    }
}

/// Notes to play on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    /// Step that was just reached
    pub step: usize,
    /// Every track with a note at `step`
    pub triggers: TrackSet,
}

/// Result of one clock check.
///
/// Releases always apply before the step's triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockOutput {
    pub releases: TrackSet,
    pub step: Option<StepEvent>,
}

impl ClockOutput {
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty() && self.step.is_none()
    }
}

/// Tick-based timing state machine
#[derive(Debug, Clone)]
pub struct SequencerClock {
    state: ClockState,
    bpm: u16,
    resolution: StepResolution,
    gate: f32,
    current_step: usize,
    /// Step the next tick will play
    next_step: usize,
    elapsed_since_last_tick: Duration,
    /// Length of the step in progress, fixed when the step started
    current_interval: Duration,
    /// Tracks triggered by the last tick and not yet released
    held: TrackSet,
}

impl SequencerClock {
    pub fn new() -> Self {
        let resolution = StepResolution::default();
        Self {
            state: ClockState::Stopped,
            bpm: DEFAULT_BPM,
            resolution,
            gate: DEFAULT_GATE,
            current_step: 0,
            next_step: 0,
            elapsed_since_last_tick: Duration::ZERO,
            current_interval: resolution.tick_interval(DEFAULT_BPM),
            held: TrackSet::empty(),
        }
    }

    /// Set the held fraction of a step, clamped into (0, 1).
    /// A non-finite gate falls back to the default.
    pub fn with_gate(mut self, gate: f32) -> Self {
        self.gate = if gate.is_finite() {
            gate.clamp(0.01, 0.99)
        } else {
            DEFAULT_GATE
        };
        self
    }

    pub fn is_active(&self) -> bool {
        self.state.is_running()
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    pub fn resolution(&self) -> StepResolution {
        self.resolution
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn elapsed_since_last_tick(&self) -> Duration {
        self.elapsed_since_last_tick
    }

    /// Tracks sounding from the last tick
    pub fn held(&self) -> TrackSet {
        self.held
    }

    /// Start or stop the clock. Position and accumulated time are kept.
    pub fn set_active(&mut self, active: bool) {
        let state = if active {
            ClockState::Running
        } else {
            ClockState::Stopped
        };
        if state != self.state {
            log::debug!("Clock {:?} -> {:?}", self.state, state);
            if state.is_running() {
                self.current_interval = self.tick_interval();
            }
            self.state = state;
        }
    }

    /// Change tempo. Out-of-range values are rejected and the old tempo kept.
    pub fn set_bpm(&mut self, bpm: u16) -> Result<(), SequencerError> {
        self.bpm = validate_bpm(bpm)?;
        Ok(())
    }

    pub fn set_resolution(&mut self, resolution: StepResolution) {
        self.resolution = resolution;
    }

    /// Change resolution from a menu list index
    pub fn set_resolution_index(&mut self, index: usize) -> Result<(), SequencerError> {
        self.resolution = StepResolution::from_index(index)?;
        Ok(())
    }

    /// Keep the step cursor inside a pattern that was just resized
    pub fn wrap_to_length(&mut self, length: usize) {
        let length = length.max(1);
        self.current_step %= length;
        self.next_step %= length;
    }

    /// Interval between ticks at the current tempo and resolution.
    /// The step in progress keeps the interval it started with.
    pub fn tick_interval(&self) -> Duration {
        self.resolution.tick_interval(self.bpm)
    }

    /// Length of the step in progress
    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Accumulate elapsed time and produce at most one tick.
    ///
    /// While stopped, the first check releases any held notes and later checks
    /// do nothing. If the loop fell behind by more than one whole interval,
    /// the missed ticks are dropped rather than played in a burst.
    pub fn advance(&mut self, elapsed: Duration, pattern: &Pattern) -> ClockOutput {
        let mut output = ClockOutput::default();

        if !self.state.is_running() {
            output.releases = self.held.take();
            return output;
        }

        self.elapsed_since_last_tick += elapsed;
        let interval = self.current_interval;

        if !self.held.is_empty() && self.elapsed_since_last_tick >= interval.mul_f32(self.gate) {
            output.releases = self.held.take();
        }

        if self.elapsed_since_last_tick >= interval {
            let mut remainder = self.elapsed_since_last_tick - interval;
            if remainder >= interval {
                log::debug!("Clock fell behind by {:?}, skipping missed ticks", remainder);
                remainder = Duration::ZERO;
            }
            self.elapsed_since_last_tick = remainder;
            // Tempo and resolution changes take effect from here
            self.current_interval = self.tick_interval();

            let length = pattern.length();
            let step = self.next_step % length;
            self.current_step = step;
            self.next_step = (step + 1) % length;

            let triggers = pattern.notes_at(step);
            self.held = triggers;
            output.step = Some(StepEvent { step, triggers });
        }

        output
    }
}

impl Default for SequencerClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::track::Track;

    fn running_clock() -> SequencerClock {
        let mut clock = SequencerClock::new();
        clock.set_active(true);
        clock
    }

    #[test]
    fn test_stopped_clock_ignores_time() {
        let mut clock = SequencerClock::new();
        let pattern = Pattern::default();

        let output = clock.advance(Duration::from_secs(10), &pattern);
        assert!(output.is_empty());
        assert_eq!(clock.current_step(), 0);
        assert_eq!(clock.elapsed_since_last_tick(), Duration::ZERO);
    }

    #[test]
    fn test_tick_after_interval() {
        let mut clock = running_clock();
        let pattern = Pattern::default();
        let interval = clock.tick_interval();

        let output = clock.advance(interval / 2, &pattern);
        assert!(output.step.is_none());

        let output = clock.advance(interval / 2, &pattern);
        assert_eq!(output.step.map(|event| event.step), Some(0));

        let output = clock.advance(interval, &pattern);
        assert_eq!(output.step.map(|event| event.step), Some(1));
        assert_eq!(clock.current_step(), 1);
    }

    #[test]
    fn test_wraps_to_zero() {
        let mut clock = running_clock();
        let pattern = Pattern::new(3).unwrap();
        let interval = clock.tick_interval();

        let steps: Vec<usize> = (0..7)
            .filter_map(|_| clock.advance(interval, &pattern).step)
            .map(|event| event.step)
            .collect();
        assert_eq!(steps, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_triggers_and_gate_release() {
        let mut clock = running_clock();
        let mut pattern = Pattern::default();
        pattern.set_note(0, 0, 1).unwrap();
        let interval = clock.tick_interval();

        let output = clock.advance(interval, &pattern);
        let event = output.step.unwrap();
        assert!(event.triggers.contains(Track::new(0).unwrap()));
        assert!(clock.held().contains(Track::new(0).unwrap()));

        // Gate is half a step
        let output = clock.advance(interval.mul_f32(0.6), &pattern);
        assert!(output.releases.contains(Track::new(0).unwrap()));
        assert!(output.step.is_none());
        assert!(clock.held().is_empty());
    }

    #[test]
    fn test_stop_flushes_held_notes() {
        let mut clock = running_clock();
        let mut pattern = Pattern::default();
        pattern.set_note(3, 0, 4).unwrap();
        let interval = clock.tick_interval();

        clock.advance(interval, &pattern);
        clock.set_active(false);

        let output = clock.advance(interval, &pattern);
        assert!(output.releases.contains(Track::CLOSED_HAT));
        assert!(output.step.is_none());

        let output = clock.advance(interval, &pattern);
        assert!(output.is_empty());
    }

    #[test]
    fn test_restart_keeps_position() {
        let mut clock = running_clock();
        let pattern = Pattern::default();
        let interval = clock.tick_interval();

        clock.advance(interval, &pattern);
        clock.advance(interval, &pattern);
        clock.set_active(false);
        clock.set_active(true);

        let output = clock.advance(interval, &pattern);
        assert_eq!(output.step.map(|event| event.step), Some(2));
    }

    #[test]
    fn test_invalid_bpm_keeps_previous() {
        let mut clock = SequencerClock::new();
        clock.set_bpm(90).unwrap();

        assert!(clock.set_bpm(300).is_err());
        assert!(clock.set_bpm(10).is_err());
        assert_eq!(clock.bpm(), 90);
    }

    #[test]
    fn test_invalid_resolution_index_keeps_previous() {
        let mut clock = SequencerClock::new();
        clock.set_resolution(StepResolution::Eighth);

        assert!(clock.set_resolution_index(42).is_err());
        assert_eq!(clock.resolution(), StepResolution::Eighth);
    }

    #[test]
    fn test_tempo_change_applies_to_next_interval() {
        let mut clock = running_clock();
        let pattern = Pattern::default();
        let slow = clock.tick_interval();

        clock.advance(slow / 2, &pattern);
        clock.set_bpm(240).unwrap();
        let fast = clock.tick_interval();
        assert!(fast < slow);

        // The step in progress keeps its original length
        assert!(clock.advance(Duration::ZERO, &pattern).step.is_none());
        assert!(clock.advance(fast / 2, &pattern).step.is_none());
        let output = clock.advance(slow / 2 - fast / 2, &pattern);
        assert_eq!(output.step.map(|event| event.step), Some(0));

        // The next step runs at the new tempo
        assert_eq!(clock.current_interval(), fast);
        let output = clock.advance(fast, &pattern);
        assert_eq!(output.step.map(|event| event.step), Some(1));
    }

    #[test]
    fn test_slower_tempo_does_not_stretch_current_step() {
        let mut clock = running_clock();
        let pattern = Pattern::default();
        clock.set_bpm(240).unwrap();
        clock.set_active(false);
        clock.set_active(true);
        let fast = clock.tick_interval();

        clock.advance(fast.mul_f32(0.9), &pattern);
        clock.set_bpm(60).unwrap();

        let output = clock.advance(fast - fast.mul_f32(0.9), &pattern);
        assert_eq!(output.step.map(|event| event.step), Some(0));
        assert_eq!(clock.current_interval(), clock.tick_interval());
    }

    #[test]
    fn test_resolution_change_applies_to_next_interval() {
        let mut clock = running_clock();
        let pattern = Pattern::default();
        let sixteenth = clock.tick_interval();

        clock.advance(sixteenth / 2, &pattern);
        clock.set_resolution(StepResolution::Quarter);
        let output = clock.advance(sixteenth / 2, &pattern);
        assert!(output.step.is_some());
        assert_eq!(clock.current_interval(), sixteenth * 4);
    }

    #[test]
    fn test_non_finite_gate_uses_default() {
        let mut pattern = Pattern::default();
        pattern.set_note(0, 0, 1).unwrap();

        for gate in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let mut clock = SequencerClock::new().with_gate(gate);
            clock.set_active(true);
            let interval = clock.tick_interval();

            clock.advance(interval, &pattern);
            // Released at the default half step
            let output = clock.advance(interval / 2, &pattern);
            assert!(output.releases.contains(Track::new(0).unwrap()), "{}", gate);
        }
    }

    #[test]
    fn test_missed_ticks_are_dropped() {
        let mut clock = running_clock();
        let pattern = Pattern::default();
        let interval = clock.tick_interval();

        let output = clock.advance(interval * 5, &pattern);
        assert_eq!(output.step.map(|event| event.step), Some(0));
        assert_eq!(clock.elapsed_since_last_tick(), Duration::ZERO);
    }

    #[test]
    fn test_wrap_to_length() {
        let mut clock = running_clock();
        let pattern = Pattern::default();
        let interval = clock.tick_interval();
        for _ in 0..10 {
            clock.advance(interval, &pattern);
        }
        assert_eq!(clock.current_step(), 9);

        let short = Pattern::new(4).unwrap();
        clock.wrap_to_length(4);
        assert_eq!(clock.current_step(), 1);
        let output = clock.advance(interval, &short);
        assert_eq!(output.step.map(|event| event.step), Some(2));
    }
}
