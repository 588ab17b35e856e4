//! Input normalization - turns every physical input into a [`SelectionIntent`].
//!
//! ## Sources
//!
//! - **Buttons**: 3 active-low switches (PREV, NEXT, SELECT), sampled by the
//!   poll loop and debounced by [`ButtonPoller`].
//! - **Encoder**: rotation steps and the push switch, delivered by the
//!   encoder task as [`EncoderEvent`]s.
//! - **MIDI**: reassembled messages from the serial and USB parsers,
//!   mapped through the configured [`MidiBindings`].
//!
//! Every source ends up calling [`Normalizer::normalize`], so all of them
//! share one intent vocabulary and one path into the selection state.

pub mod debounce;
pub mod normalizer;

pub use debounce::ButtonPoller;
pub use normalizer::{MidiBindings, Normalizer};

use crate::midi::MidiEvent;

/// Physical buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Previous,
    Next,
    Select,
}

impl Button {
    pub(crate) fn slot(self) -> usize {
        match self {
            Button::Previous => 0,
            Button::Next => 1,
            Button::Select => 2,
        }
    }
}

/// Events reported by the rotary encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderEvent {
    Clockwise,
    CounterClockwise,
    Click,
}

/// One raw event from any input source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RawEvent {
    /// A debounced button press.
    Button(Button),
    Encoder(EncoderEvent),
    Midi(MidiEvent),
}

/// What the user asked the selector to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectionIntent {
    Next,
    Previous,
    /// Select this option and launch it in the same step.
    JumpTo(usize),
    Confirm,
}
