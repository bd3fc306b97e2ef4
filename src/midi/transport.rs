// MIDI transports - USB and UART ports behind one narrow interface

use crate::midi::event::MidiMessage;
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Producer, Split};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Capacity of the queue between the midir callback thread and the poll loop.
/// At 31250 baud a port delivers ~1000 messages/second, so this covers well
/// over 100ms of backlog.
pub const INPUT_QUEUE_CAPACITY: usize = 256;

/// Errors raised while opening a hardware port
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("MIDI init error: {0}")]
    Init(String),

    #[error("MIDI connection error: {0}")]
    Connect(String),
}

/// One bidirectional MIDI transport.
///
/// `send` never blocks and has no result: a failed send is logged and the
/// message dropped. `receive` returns `None` when nothing is queued.
pub trait MidiPort {
    fn send(&mut self, message: &MidiMessage);
    fn receive(&mut self) -> Option<MidiMessage>;
}

/// Which of the two transports a message came from or goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortId {
    Usb,
    Uart,
}

impl PortId {
    pub const ALL: [PortId; 2] = [PortId::Usb, PortId::Uart];
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortId::Usb => f.write_str("USB"),
            PortId::Uart => f.write_str("UART"),
        }
    }
}

/// The USB and hardware-serial transports
pub struct MidiPorts {
    usb: Box<dyn MidiPort>,
    uart: Box<dyn MidiPort>,
}

impl MidiPorts {
    pub fn new(usb: Box<dyn MidiPort>, uart: Box<dyn MidiPort>) -> Self {
        Self { usb, uart }
    }

    /// Two ports that drop everything; for running without MIDI hardware
    pub fn disconnected() -> Self {
        Self::new(Box::new(NullPort), Box::new(NullPort))
    }

    pub fn port_mut(&mut self, id: PortId) -> &mut dyn MidiPort {
        match id {
            PortId::Usb => self.usb.as_mut(),
            PortId::Uart => self.uart.as_mut(),
        }
    }

    /// Send the same message on both transports (UART first, then USB)
    pub fn send_all(&mut self, message: &MidiMessage) {
        self.uart.send(message);
        self.usb.send(message);
    }
}

/// Port with nothing attached
pub struct NullPort;

impl MidiPort for NullPort {
    fn send(&mut self, _message: &MidiMessage) {}

    fn receive(&mut self) -> Option<MidiMessage> {
        None
    }
}

#[derive(Debug, Default)]
struct MemoryPortState {
    inbox: VecDeque<MidiMessage>,
    sent: Vec<MidiMessage>,
}

/// In-process port: queued input and a record of everything sent.
///
/// Clones share the same queues, so a caller can keep a handle after moving
/// the port into the application context.
#[derive(Debug, Clone, Default)]
pub struct MemoryPort {
    state: Rc<RefCell<MemoryPortState>>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message as if it arrived on the wire
    pub fn inject(&self, message: MidiMessage) {
        self.state.borrow_mut().inbox.push_back(message);
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().inbox.len()
    }

    /// Everything sent so far, oldest first
    pub fn sent(&self) -> Vec<MidiMessage> {
        self.state.borrow().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.state.borrow_mut().sent.clear();
    }
}

impl MidiPort for MemoryPort {
    fn send(&mut self, message: &MidiMessage) {
        self.state.borrow_mut().sent.push(*message);
    }

    fn receive(&mut self) -> Option<MidiMessage> {
        self.state.borrow_mut().inbox.pop_front()
    }
}

/// Hardware port backed by midir.
///
/// Incoming bytes are parsed on midir's callback thread and pushed into a
/// lock-free ring buffer; `receive` pops from it on the poll loop.
pub struct MidirPort {
    label: String,
    output: Option<MidiOutputConnection>,
    _input: Option<MidiInputConnection<()>>,
    inbox: ringbuf::HeapCons<MidiMessage>,
}

impl MidirPort {
    /// Open the first input and output ports whose names contain `name_filter`.
    ///
    /// A missing input or output is not an error: that direction stays silent.
    pub fn open(label: &str, name_filter: &str) -> Result<Self, MidiError> {
        let (mut producer, consumer) = HeapRb::<MidiMessage>::new(INPUT_QUEUE_CAPACITY).split();

        let midi_in = MidiInput::new(&format!("drum_machine {} in", label))
            .map_err(|e| MidiError::Init(e.to_string()))?;
        let input_port = midi_in.ports().into_iter().find(|port| {
            midi_in
                .port_name(port)
                .map(|name| name.contains(name_filter))
                .unwrap_or(false)
        });

        let input = match input_port {
            Some(port) => {
                let connection = midi_in
                    .connect(
                        &port,
                        "drum-machine-input",
                        move |_timestamp, bytes, _| {
                            let message = MidiMessage::from_bytes(bytes);
                            if producer.try_push(message).is_err() {
                                log::warn!("MIDI input queue full, message dropped");
                            }
                        },
                        (),
                    )
                    .map_err(|e| MidiError::Connect(e.to_string()))?;
                log::info!("{} MIDI input connected ({})", label, name_filter);
                Some(connection)
            }
            None => {
                log::warn!("No {} MIDI input matching '{}'", label, name_filter);
                None
            }
        };

        let midi_out = MidiOutput::new(&format!("drum_machine {} out", label))
            .map_err(|e| MidiError::Init(e.to_string()))?;
        let output_port = midi_out.ports().into_iter().find(|port| {
            midi_out
                .port_name(port)
                .map(|name| name.contains(name_filter))
                .unwrap_or(false)
        });

        let output = match output_port {
            Some(port) => {
                let connection = midi_out
                    .connect(&port, "drum-machine-output")
                    .map_err(|e| MidiError::Connect(e.to_string()))?;
                log::info!("{} MIDI output connected ({})", label, name_filter);
                Some(connection)
            }
            None => {
                log::warn!("No {} MIDI output matching '{}'", label, name_filter);
                None
            }
        };

        Ok(Self {
            label: label.to_string(),
            output,
            _input: input,
            inbox: consumer,
        })
    }
}

impl MidiPort for MidirPort {
    fn send(&mut self, message: &MidiMessage) {
        let bytes = message.to_bytes();
        if bytes.as_slice().is_empty() {
            return;
        }
        if let Some(output) = self.output.as_mut() {
            if let Err(e) = output.send(bytes.as_slice()) {
                log::warn!("{} MIDI send failed: {}", self.label, e);
            }
        }
    }

    fn receive(&mut self) -> Option<MidiMessage> {
        self.inbox.try_pop()
    }
}
