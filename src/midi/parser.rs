//! Running-status MIDI reassembler.
//!
//! Rules applied per byte:
//!
//! ```text
//! 0xF8..=0xFF  real-time      -> emitted alone, state untouched
//! 0xF0 / 0xF7  SysEx framing  -> emitted alone, running status kept
//! 0xF1..=0xF6  system common  -> cancels running status, dropped
//! 0x80..=0xEF  channel status -> new running status, collection restarts
//! 0x00..=0x7F  data           -> appended under the running status
//! ```
//!
//! Once a message is complete the collection cursor returns to the first
//! data slot, so following data bytes start the next message under the
//! same status.

use super::{is_channel_status, message_length, ChannelMessage, MidiEvent, Transport};
use crate::config::MIDI_MESSAGE_CAPACITY;

/// Per-transport reassembly state.
#[derive(Clone, Debug)]
pub struct MidiParser {
    transport: Transport,
    /// Current running status, `None` until a channel status byte arrives.
    running_status: Option<u8>,
    pending: [u8; MIDI_MESSAGE_CAPACITY],
    cursor: usize,
    expected_len: usize,
    in_sysex: bool,
}

impl MidiParser {
    pub const fn new(transport: Transport) -> Self {
        Self {
            transport,
            running_status: None,
            pending: [0; MIDI_MESSAGE_CAPACITY],
            cursor: 0,
            expected_len: 3,
            in_sysex: false,
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn running_status(&self) -> Option<u8> {
        self.running_status
    }

    /// Feed a chunk of bytes. The returned iterator yields every event
    /// completed by this chunk; partial messages carry over to the next call.
    ///
    /// Bytes not consumed because the iterator was dropped early are lost.
    pub fn feed<'a>(&'a mut self, bytes: &'a [u8]) -> Feed<'a> {
        Feed {
            parser: self,
            bytes: bytes.iter(),
        }
    }

    /// Process one byte.
    pub fn push(&mut self, byte: u8) -> Option<MidiEvent> {
        match byte {
            0xF8..=0xFF => Some(MidiEvent::RealTime(byte)),
            0xF0 => {
                self.in_sysex = true;
                Some(MidiEvent::SysExStart)
            }
            0xF7 => {
                self.in_sysex = false;
                Some(MidiEvent::SysExEnd)
            }
            0xF1..=0xF6 => {
                self.running_status = None;
                self.cursor = 0;
                self.in_sysex = false;
                None
            }
            status if is_channel_status(status) => {
                self.in_sysex = false;
                self.running_status = Some(status);
                self.expected_len = message_length(status);
                self.cursor = 0;
                self.append(status);
                None
            }
            data => self.push_data(data),
        }
    }

    fn push_data(&mut self, data: u8) -> Option<MidiEvent> {
        if self.in_sysex {
            return None;
        }
        let Some(status) = self.running_status else {
            #[cfg(feature = "defmt")]
            defmt::debug!("MIDI {}: orphan data byte {=u8:#x}", self.transport, data);
            return None;
        };

        self.append(data);

        if self.cursor < self.expected_len {
            return None;
        }

        let message = ChannelMessage {
            status,
            data1: self.pending[1],
            data2: (self.expected_len == 3).then_some(self.pending[2]),
        };
        // Next message reuses the running status.
        self.cursor = 1;
        Some(MidiEvent::Channel(message))
    }

    fn append(&mut self, byte: u8) {
        if self.cursor < MIDI_MESSAGE_CAPACITY {
            self.pending[self.cursor] = byte;
            self.cursor += 1;
        }
    }
}

/// Lazy sequence of events produced by [`MidiParser::feed`].
pub struct Feed<'a> {
    parser: &'a mut MidiParser,
    bytes: core::slice::Iter<'a, u8>,
}

impl Iterator for Feed<'_> {
    type Item = MidiEvent;

    fn next(&mut self) -> Option<MidiEvent> {
        for &byte in self.bytes.by_ref() {
            if let Some(event) = self.parser.push(byte) {
                return Some(event);
            }
        }
        None
    }
}
