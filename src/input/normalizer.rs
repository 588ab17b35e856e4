//! Maps raw input events to selection intents.

use heapless::Vec;

use super::{Button, EncoderEvent, RawEvent, SelectionIntent};
use crate::config::MAX_OPTIONS;
use crate::midi::{MessageKind, MidiEvent};

/// MIDI controller and note numbers the selector responds to.
///
/// Channels are not filtered: a binding matches on any channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiBindings {
    pub next_cc: u8,
    pub prev_cc: u8,
    pub select_cc: u8,
    /// `notes[i]` jumps to and launches option `i`.
    pub notes: Vec<u8, MAX_OPTIONS>,
}

/// Stateless event → intent mapping.
#[derive(Clone, Debug)]
pub struct Normalizer {
    bindings: MidiBindings,
}

impl Normalizer {
    pub fn new(bindings: MidiBindings) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &MidiBindings {
        &self.bindings
    }

    /// Return the intent for one raw event, if it has one.
    pub fn normalize(&self, event: RawEvent) -> Option<SelectionIntent> {
        match event {
            RawEvent::Button(button) => Some(match button {
                Button::Previous => SelectionIntent::Previous,
                Button::Next => SelectionIntent::Next,
                Button::Select => SelectionIntent::Confirm,
            }),
            RawEvent::Encoder(event) => Some(match event {
                EncoderEvent::Clockwise => SelectionIntent::Next,
                EncoderEvent::CounterClockwise => SelectionIntent::Previous,
                EncoderEvent::Click => SelectionIntent::Confirm,
            }),
            RawEvent::Midi(event) => self.normalize_midi(event),
        }
    }

    fn normalize_midi(&self, event: MidiEvent) -> Option<SelectionIntent> {
        let MidiEvent::Channel(message) = event else {
            return None;
        };

        match message.kind() {
            // Zero value is the button release; only the press acts.
            MessageKind::ControlChange { value: 0, .. } => None,
            MessageKind::ControlChange { controller, .. } => {
                if controller == self.bindings.next_cc {
                    Some(SelectionIntent::Next)
                } else if controller == self.bindings.prev_cc {
                    Some(SelectionIntent::Previous)
                } else if controller == self.bindings.select_cc {
                    Some(SelectionIntent::Confirm)
                } else {
                    None
                }
            }
            MessageKind::NoteOn { velocity: 0, .. } => None,
            MessageKind::NoteOn { note, .. } => self
                .bindings
                .notes
                .iter()
                .position(|&bound| bound == note)
                .map(SelectionIntent::JumpTo),
            _ => None,
        }
    }
}
