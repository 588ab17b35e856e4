//! Integration tests for the multisynth selection pipeline.

use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use multisynth::config::DEFAULT_OPTIONS;
use multisynth::input::{ButtonPoller, Normalizer};
use multisynth::midi::packets;
use multisynth::{
    BootDispatcher, Button, Error, Handoff, MidiParser, OptionList, RawEvent, SelectionIntent,
    SelectionObserver, Settings, SharedSelection, Shutdown, SynthOption, Teardown, Transition,
    Transport,
};

fn options() -> OptionList<'static> {
    OptionList::new(&DEFAULT_OPTIONS).expect("default table is valid")
}

/// Feed bytes from one transport through parser, normalizer and selection.
fn drive<O: SelectionObserver>(
    selection: &SharedSelection<'_, CriticalSectionRawMutex, O>,
    parser: &mut MidiParser,
    normalizer: &Normalizer,
    bytes: &[u8],
) {
    for event in parser.feed(bytes) {
        if let Some(intent) = normalizer.normalize(RawEvent::Midi(event)) {
            selection.submit(intent);
        }
    }
}

#[test]
fn serial_note_launches_its_option() {
    let selection = SharedSelection::<CriticalSectionRawMutex, ()>::new(options(), ());
    let normalizer = Normalizer::new(Settings::default().midi_bindings());
    let mut serial = MidiParser::new(Transport::Serial);

    // Clock ticks around a Note-On for note 38, split mid-message.
    drive(&selection, &mut serial, &normalizer, &[0xF8, 0x90, 38]);
    assert!(!selection.is_confirmed());
    drive(&selection, &mut serial, &normalizer, &[0xF8, 100]);

    let target = selection.boot_target().expect("note confirms");
    assert_eq!(target.index(), 1);
    assert_eq!(target.option().boot_key, "minijv880");
}

#[test]
fn usb_packets_feed_the_same_pipeline() {
    let selection = SharedSelection::<CriticalSectionRawMutex, ()>::new(options(), ());
    let normalizer = Normalizer::new(Settings::default().midi_bindings());
    let mut usb = MidiParser::new(Transport::Usb);

    // Two CC47 presses then a Note-On for note 36, cable 0, plus a trailing fragment.
    let transfer = [
        0x0B, 0xB0, 47, 127, //
        0x0B, 0xB0, 47, 127, //
        0x09, 0x90, 36, 90, //
        0x09, 0x90,
    ];
    for packet in packets(&transfer) {
        drive(&selection, &mut usb, &normalizer, packet.payload());
    }

    let state = selection.state();
    assert!(state.confirmed);
    assert_eq!(state.current_index, 0);
}

#[test]
fn transports_keep_separate_running_status() {
    let selection = SharedSelection::<CriticalSectionRawMutex, ()>::new(options(), ());
    let normalizer = Normalizer::new(Settings::default().midi_bindings());
    let mut serial = MidiParser::new(Transport::Serial);
    let mut usb = MidiParser::new(Transport::Usb);

    // Serial establishes CC running status but sends only the controller.
    drive(&selection, &mut serial, &normalizer, &[0xB0, 47]);
    // USB sends a bare data pair with no status of its own: dropped.
    drive(&selection, &mut usb, &normalizer, &[47, 127]);
    assert_eq!(selection.state().current_index, 0);

    // Serial completes its message.
    drive(&selection, &mut serial, &normalizer, &[127]);
    assert_eq!(selection.state().current_index, 1);
}

#[test]
fn debounced_buttons_navigate_once_per_press() {
    let settings = Settings::default();
    let normalizer = Normalizer::new(settings.midi_bindings());
    let mut poller = ButtonPoller::new(settings.debounce_ms);
    let selection = SharedSelection::<CriticalSectionRawMutex, ()>::new(options(), ());

    // (ms, next pin level) sampled every 10 ms; bounces at 20 and 40 ms.
    let next_samples = [
        (0, true),
        (10, true),
        (20, false),
        (30, true),
        (40, false),
        (50, false),
        (300, true),
        (310, true),
        (320, false),
    ];
    for (now, pressed) in next_samples {
        if let Some(button) = poller.sample(Button::Next, pressed, now) {
            if let Some(intent) = normalizer.normalize(RawEvent::Button(button)) {
                selection.submit(intent);
            }
        }
    }
    assert_eq!(selection.state().current_index, 2);

    let select = poller.sample(Button::Select, true, 330).expect("select edge");
    let intent = normalizer.normalize(RawEvent::Button(select)).unwrap();
    assert_eq!(selection.submit(intent), Transition::Confirmed(2));
}

#[test]
fn settings_rebind_midi_controls() {
    let mut settings = Settings::default();
    settings
        .apply_properties("MIDIButtonNext=20\nMIDINote1=60\n")
        .unwrap();
    let normalizer = Normalizer::new(settings.midi_bindings());
    let selection = SharedSelection::<CriticalSectionRawMutex, ()>::new(options(), ());
    let mut serial = MidiParser::new(Transport::Serial);

    drive(&selection, &mut serial, &normalizer, &[0xB0, 47, 127, 20, 127]);
    assert_eq!(selection.state().current_index, 1);
    drive(&selection, &mut serial, &normalizer, &[0x90, 36, 100]);
    assert!(!selection.is_confirmed());
    drive(&selection, &mut serial, &normalizer, &[60, 100]);
    assert_eq!(selection.boot_target().unwrap().index(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// Concurrency
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct CountingObserver {
    changes: AtomicUsize,
    confirms: AtomicUsize,
}

impl SelectionObserver for CountingObserver {
    fn selection_changed(&self, _index: usize, _option: &SynthOption) {
        self.changes.fetch_add(1, Ordering::Relaxed);
    }

    fn confirmed(&self, _index: usize, _option: &SynthOption) {
        self.confirms.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn concurrent_sources_never_lose_an_intent() {
    const NEXTS_PER_THREAD: usize = 500;
    const PREVS_PER_THREAD: usize = 300;

    let selection =
        SharedSelection::<CriticalSectionRawMutex, _>::new(options(), CountingObserver::default());

    std::thread::scope(|scope| {
        for _ in 0..2 {
            scope.spawn(|| {
                for _ in 0..NEXTS_PER_THREAD {
                    selection.submit(SelectionIntent::Next);
                }
            });
            scope.spawn(|| {
                for _ in 0..PREVS_PER_THREAD {
                    selection.submit(SelectionIntent::Previous);
                }
            });
        }
    });

    let net = 2 * (NEXTS_PER_THREAD - PREVS_PER_THREAD);
    assert_eq!(selection.state().current_index, net % DEFAULT_OPTIONS.len());
    assert_eq!(
        selection.observer().changes.load(Ordering::Relaxed),
        2 * (NEXTS_PER_THREAD + PREVS_PER_THREAD)
    );
}

#[test]
fn concurrent_confirms_confirm_once() {
    let selection =
        SharedSelection::<CriticalSectionRawMutex, _>::new(options(), CountingObserver::default());

    std::thread::scope(|scope| {
        for i in 0..4 {
            let selection = &selection;
            scope.spawn(move || {
                let intent = if i % 2 == 0 {
                    SelectionIntent::Confirm
                } else {
                    SelectionIntent::JumpTo(2)
                };
                selection.submit(intent);
            });
        }
    });

    assert!(selection.is_confirmed());
    assert_eq!(selection.observer().confirms.load(Ordering::Relaxed), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Boot Dispatch
// ═══════════════════════════════════════════════════════════════════════════

struct Recorder<'a> {
    steps: &'a RefCell<Vec<String>>,
    boot_result: Result<(), Error>,
}

impl Teardown for &Recorder<'_> {
    fn release_peripherals(&mut self) -> Result<(), Error> {
        self.steps.borrow_mut().push("release".into());
        Ok(())
    }

    fn unmount_storage(&mut self) -> Result<(), Error> {
        self.steps.borrow_mut().push("unmount".into());
        Err(Error::Storage)
    }
}

impl Handoff for &Recorder<'_> {
    fn boot(&mut self, option: &SynthOption) -> Result<(), Error> {
        self.steps.borrow_mut().push(format!("boot {}", option.boot_key));
        self.boot_result
    }
}

#[test]
fn confirmed_selection_is_dispatched_in_order() {
    let selection = SharedSelection::<CriticalSectionRawMutex, ()>::new(options(), ());
    selection.submit(SelectionIntent::Previous);
    selection.submit(SelectionIntent::Confirm);
    let target = selection.boot_target().unwrap();

    let steps = RefCell::new(Vec::new());
    let recorder = Recorder {
        steps: &steps,
        boot_result: Ok(()),
    };
    let shutdown = BootDispatcher::new(&recorder, &recorder).dispatch(target);

    assert_eq!(shutdown, Shutdown::Reboot);
    assert_eq!(*steps.borrow(), ["release", "unmount", "boot mt32pi"]);
}

#[test]
fn failed_handoff_halts() {
    let selection = SharedSelection::<CriticalSectionRawMutex, ()>::new(options(), ());
    selection.submit(SelectionIntent::JumpTo(0));

    let steps = RefCell::new(Vec::new());
    let recorder = Recorder {
        steps: &steps,
        boot_result: Err(Error::ImageNotFound),
    };
    let shutdown =
        BootDispatcher::new(&recorder, &recorder).dispatch(selection.boot_target().unwrap());

    assert_eq!(shutdown, Shutdown::Halt);
    assert_eq!(steps.borrow().last().map(String::as_str), Some("boot minidexed"));
}
