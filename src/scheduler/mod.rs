// Scheduling loop - single-threaded cooperative driver
//
// One pass runs four bounded units in a fixed order: clock, MIDI input, touch,
// controls. Each unit is fully applied before the next one is polled.

pub mod context;

pub use context::AppContext;

use crate::menu::{self, MenuEdit, MenuError};
use crate::midi::PortId;
use crate::router;
use std::time::{Duration, Instant};

/// Most menu edits taken from the control source in one pass
pub const MAX_CONTROL_EDITS_PER_PASS: usize = 8;

/// Touch hardware
pub trait TouchSource {
    /// Poll the pads, calling `on_press` with the step position of every new press
    fn update(&mut self, on_press: &mut dyn FnMut(usize));
}

/// Buttons and encoders, already interpreted by the menu layer
pub trait ControlSource {
    /// Next committed menu edit, if any
    fn poll(&mut self) -> Option<MenuEdit>;

    /// Outcome of an edit taken from `poll`, for the menu to display
    fn report(&mut self, _edit: &MenuEdit, _result: &Result<(), MenuError>) {}
}

/// Touch source with no pads
pub struct NoTouch;

impl TouchSource for NoTouch {
    fn update(&mut self, _on_press: &mut dyn FnMut(usize)) {}
}

/// Control source with no inputs
pub struct NoControls;

impl ControlSource for NoControls {
    fn poll(&mut self) -> Option<MenuEdit> {
        None
    }
}

/// What one pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// A step was reached
    pub ticked: bool,
    pub midi_messages: usize,
    pub touches: usize,
    pub edits: usize,
}

/// Cooperative driver owning the application context and its input sources
pub struct Scheduler {
    context: AppContext,
    touch: Box<dyn TouchSource>,
    controls: Box<dyn ControlSource>,
    last_pass: Option<Instant>,
}

impl Scheduler {
    pub fn new(
        context: AppContext,
        touch: Box<dyn TouchSource>,
        controls: Box<dyn ControlSource>,
    ) -> Self {
        Self {
            context,
            touch,
            controls,
            last_pass: None,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.context
    }

    /// Run one pass, treating `elapsed` as the time since the previous pass
    pub fn run_pass(&mut self, elapsed: Duration) -> PassReport {
        let mut report = PassReport::default();
        let ctx = &mut self.context;

        // Clock
        let output = ctx.clock.advance(elapsed, &ctx.pattern);
        report.ticked = output.step.is_some();
        router::apply_clock(ctx, output);

        // MIDI input, bounded per port
        let limit = ctx.settings.midi_batch_limit;
        for port in PortId::ALL {
            report.midi_messages += router::drain_midi(ctx, port, limit);
        }

        // Touch
        let mut touches = 0;
        self.touch.update(&mut |position| {
            touches += 1;
            router::handle_touch(ctx, position);
        });
        report.touches = touches;

        // Controls
        while report.edits < MAX_CONTROL_EDITS_PER_PASS {
            let Some(edit) = self.controls.poll() else {
                break;
            };
            let result = menu::apply(ctx, edit.clone());
            if let Err(e) = &result {
                log::warn!("Menu edit {:?} rejected: {}", edit, e);
            }
            self.controls.report(&edit, &result);
            report.edits += 1;
        }

        report
    }

    /// Run one pass timed against the wall clock
    pub fn step(&mut self) -> PassReport {
        let now = Instant::now();
        let elapsed = self
            .last_pass
            .map(|last| now.duration_since(last))
            .unwrap_or_default();
        self.last_pass = Some(now);
        self.run_pass(elapsed)
    }

    /// Keep running passes, sleeping the poll interval between them, until
    /// `keep_running` returns false
    pub fn run_until(&mut self, mut keep_running: impl FnMut(&AppContext) -> bool) {
        let poll_interval = self.context.settings.poll_interval();
        log::info!("Scheduler running (poll every {:?})", poll_interval);

        while keep_running(&self.context) {
            self.step();
            std::thread::sleep(poll_interval);
        }

        log::info!("Scheduler stopped");
    }
}
