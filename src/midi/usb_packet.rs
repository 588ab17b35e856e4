//! USB-MIDI 1.0 event packets.
//!
//! Layout (4 bytes):
//! ```text
//! Byte 0: Cable Number (high nibble) | Code Index Number (low nibble)
//! Byte 1-3: MIDI bytes, padded with 0x00 when the message is shorter
//! ```
//!
//! The Code Index Number tells how many of the three MIDI bytes are valid.

/// Event packet size in bytes.
pub const USB_MIDI_PACKET_SIZE: usize = 4;

/// One decoded USB-MIDI event packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbMidiPacket {
    pub cable: u8,
    pub code_index: u8,
    bytes: [u8; 3],
}

impl UsbMidiPacket {
    /// Parse from a raw 4-byte packet. Returns `None` if too short.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < USB_MIDI_PACKET_SIZE {
            return None;
        }
        Some(Self {
            cable: data[0] >> 4,
            code_index: data[0] & 0x0F,
            bytes: [data[1], data[2], data[3]],
        })
    }

    /// The MIDI bytes carried by this packet.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[..payload_len(self.code_index)]
    }
}

/// Number of valid MIDI bytes for a Code Index Number.
fn payload_len(code_index: u8) -> usize {
    match code_index {
        // Reserved: miscellaneous function codes and cable events.
        0x0 | 0x1 => 0,
        // Single-byte system common / SysEx end, single byte (raw mode).
        0x5 | 0xF => 1,
        // Two-byte system common, SysEx end with two bytes,
        // Program Change, Channel Pressure.
        0x2 | 0x6 | 0xC | 0xD => 2,
        _ => 3,
    }
}

/// Split a bulk transfer into event packets. A trailing partial packet is ignored.
pub fn packets(data: &[u8]) -> impl Iterator<Item = UsbMidiPacket> + '_ {
    data.chunks_exact(USB_MIDI_PACKET_SIZE)
        .filter_map(UsbMidiPacket::from_bytes)
}
