//! Hardware-independent core of multisynth.
//!
//! Everything that decides *what* the selector does lives here: MIDI
//! reassembly, input normalization, the selection state machine, the
//! boot dispatcher and runtime settings. It builds for the target as
//! `no_std` and on the host for tests.
//!
//! Usage: `cargo test --lib` for unit tests, `cargo test` for the
//! integration scenarios as well.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and adds the nRF52840 drivers (display, buttons, encoder, serial, USB,
//! flash, hand-off) on top of this crate.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod midi;
pub mod selector;
pub mod settings;

pub use dispatch::{release_all, BootDispatcher, Handoff, Release, Shutdown, Teardown};
pub use error::{Error, SettingError};
pub use input::{Button, EncoderEvent, RawEvent, SelectionIntent};
pub use midi::{MidiEvent, MidiParser, Transport};
pub use selector::{
    BootTarget, OptionList, Phase, SelectionObserver, SelectionState, Selector, SharedSelection,
    SynthOption, Transition,
};
pub use settings::Settings;

// ═══════════════════════════════════════════════════════════════════════════
// Scenario Tests
// ═══════════════════════════════════════════════════════════════════════════
