use drum_machine::menu;
use drum_machine::midi::{MidiPort, MidiPorts, MidirPort, NullPort};
use drum_machine::persistence::FileStorage;
use drum_machine::scheduler::{NoControls, NoTouch};
use drum_machine::voice::{LoggingVoice, Voice};
use drum_machine::{AppContext, Scheduler, Settings, VoiceBank};
use std::path::PathBuf;

fn open_port(label: &str, name_filter: Option<&str>) -> Box<dyn MidiPort> {
    let Some(name_filter) = name_filter else {
        log::info!("No {} MIDI port configured", label);
        return Box::new(NullPort);
    };

    match MidirPort::open(label, name_filter) {
        Ok(port) => Box::new(port),
        Err(e) => {
            log::error!("{} MIDI unavailable: {}", label, e);
            Box::new(NullPort)
        }
    }
}

fn main() {
    env_logger::init(); // Log to stderr (set RUST_LOG=debug for per-event tracing)

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(Settings::default_path);

    let settings = match settings_path {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Could not read settings {}: {}", path.display(), e);
                return;
            }
        },
        None => Settings::default(),
    };

    let storage = FileStorage::new(settings.resolved_storage_dir());
    log::info!("Pattern storage at {}", storage.root().display());

    let midi = MidiPorts::new(
        open_port("USB", settings.usb_port.as_deref()),
        open_port("UART", settings.uart_port.as_deref()),
    );

    // Synthesis runs elsewhere; these voices only trace what they are asked to play
    let voices =
        VoiceBank::from_fn(|track| Box::new(LoggingVoice::new(track.name())) as Box<dyn Voice>);

    let mut context = AppContext::new(settings, voices, midi, Box::new(storage));
    menu::restore_slots(&mut context);
    let mut scheduler = Scheduler::new(context, Box::new(NoTouch), Box::new(NoControls));

    log::info!("Drum machine started");
    scheduler.run_until(|_| true);
}
