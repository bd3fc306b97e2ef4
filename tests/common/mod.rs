// Shared fixtures for integration tests: voices that record their calls and
// in-memory MIDI ports that can be inspected after the fact.

#![allow(dead_code)]

use drum_machine::midi::{MemoryPort, MidiPorts};
use drum_machine::persistence::{MemoryStorage, Storage};
use drum_machine::{AppContext, Settings, Track, Voice, VoiceBank, VoiceParams};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Press(usize, f32),
    Release(usize),
}

pub type Calls = Rc<RefCell<Vec<Call>>>;

/// Parameter pushes, as (track, params)
pub type Params = Rc<RefCell<Vec<(usize, VoiceParams)>>>;

struct RecordingVoice {
    track: usize,
    calls: Calls,
    params: Params,
}

impl Voice for RecordingVoice {
    fn press(&mut self, velocity: f32) {
        self.calls.borrow_mut().push(Call::Press(self.track, velocity));
    }

    fn release(&mut self) {
        self.calls.borrow_mut().push(Call::Release(self.track));
    }

    fn apply_params(&mut self, params: &VoiceParams) {
        self.params.borrow_mut().push((self.track, *params));
    }
}

pub struct Rig {
    pub context: AppContext,
    pub calls: Calls,
    pub params: Params,
    pub usb: MemoryPort,
    pub uart: MemoryPort,
}

impl Rig {
    pub fn new(settings: Settings) -> Self {
        Self::with_storage(settings, Box::new(MemoryStorage::new()))
    }

    pub fn with_storage(settings: Settings, storage: Box<dyn Storage>) -> Self {
        let calls: Calls = Rc::new(RefCell::new(Vec::new()));
        let params: Params = Rc::new(RefCell::new(Vec::new()));
        let voices = VoiceBank::from_fn(|track: Track| {
            Box::new(RecordingVoice {
                track: track.index(),
                calls: calls.clone(),
                params: params.clone(),
            }) as Box<dyn Voice>
        });
        let usb = MemoryPort::new();
        let uart = MemoryPort::new();
        let midi = MidiPorts::new(Box::new(usb.clone()), Box::new(uart.clone()));

        Self {
            context: AppContext::new(settings, voices, midi, storage),
            calls,
            params,
            usb,
            uart,
        }
    }

    /// Presses recorded so far, as (track, velocity)
    pub fn presses(&self) -> Vec<(usize, f32)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match *call {
                Call::Press(track, velocity) => Some((track, velocity)),
                Call::Release(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
        self.params.borrow_mut().clear();
        self.usb.clear_sent();
        self.uart.clear_sent();
    }
}
