//! MIDI input - byte-stream reassembly and message types.
//!
//! Two physical transports deliver MIDI to the selector:
//!
//! - **Serial** (DIN / TRS at 31250 baud): a raw byte stream that may use
//!   running status and can arrive split at any byte boundary.
//! - **USB**: 4-byte USB-MIDI event packets; the payload bytes of each
//!   packet are fed into a reassembler exactly like serial bytes.
//!
//! Each transport owns its own [`MidiParser`]. Parsers are never shared,
//! so one transport can not corrupt another's running status.

pub mod parser;
pub mod usb_packet;


pub use parser::{Feed, MidiParser};
pub use usb_packet::{packets, UsbMidiPacket};

/// Physical source of a MIDI byte stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transport {
    Serial,
    Usb,
}

/// One complete Channel-Voice message as it appeared on the wire.
///
/// `data2` is `None` for Program Change and Channel Pressure, which carry
/// a single data byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMessage {
    pub status: u8,
    pub data1: u8,
    pub data2: Option<u8>,
}

/// Typed view of a [`ChannelMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageKind {
    NoteOff { note: u8, velocity: u8 },
    NoteOn { note: u8, velocity: u8 },
    PolyPressure { note: u8, pressure: u8 },
    ControlChange { controller: u8, value: u8 },
    ProgramChange { program: u8 },
    ChannelPressure { pressure: u8 },
    /// 14-bit bend value, centre = 0x2000.
    PitchBend { value: u16 },
}

impl ChannelMessage {
    /// MIDI channel, 0-based.
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    pub fn kind(&self) -> MessageKind {
        let d1 = self.data1;
        let d2 = self.data2.unwrap_or(0);
        match self.status & 0xF0 {
            0x80 => MessageKind::NoteOff {
                note: d1,
                velocity: d2,
            },
            0x90 => MessageKind::NoteOn {
                note: d1,
                velocity: d2,
            },
            0xA0 => MessageKind::PolyPressure {
                note: d1,
                pressure: d2,
            },
            0xB0 => MessageKind::ControlChange {
                controller: d1,
                value: d2,
            },
            0xC0 => MessageKind::ProgramChange { program: d1 },
            0xD0 => MessageKind::ChannelPressure { pressure: d1 },
            _ => MessageKind::PitchBend {
                value: ((d2 as u16) << 7) | d1 as u16,
            },
        }
    }
}

/// Everything a reassembler can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MidiEvent {
    /// A complete Channel-Voice message.
    Channel(ChannelMessage),
    /// System Real-Time byte (`0xF8`..=`0xFF`), may interleave anywhere.
    RealTime(u8),
    /// `0xF0` - start of a System Exclusive frame.
    SysExStart,
    /// `0xF7` - end of a System Exclusive frame.
    SysExEnd,
}

/// True for Channel-Voice status bytes (`0x80`..=`0xEF`).
pub fn is_channel_status(byte: u8) -> bool {
    (0x80..0xF0).contains(&byte)
}

/// Number of bytes (status included) of a Channel-Voice message.
pub fn message_length(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 2,
        _ => 3,
    }
}
