//! Serial (DIN) MIDI input on UARTE0.
//!
//! Reads until the line goes idle, so a burst of bytes arrives as one
//! chunk; the chunk is fed to the serial transport's own reassembler.

use defmt::{info, warn};
use embassy_nrf::peripherals::{TIMER0, UARTE0};
use embassy_nrf::uarte::{Baudrate, UarteRxWithIdle};

use multisynth::config::{DEFAULT_MIDI_BAUD, SERIAL_READ_CHUNK};
use multisynth::input::Normalizer;
use multisynth::{MidiParser, RawEvent, Transport};

use crate::{submit_event, Selection};

/// Map a configured baud rate onto one the UARTE supports.
pub fn baudrate(baud: u32) -> Baudrate {
    match baud {
        31_250 => Baudrate::BAUD31250,
        38_400 => Baudrate::BAUD38400,
        57_600 => Baudrate::BAUD57600,
        115_200 => Baudrate::BAUD115200,
        other => {
            warn!("Serial: {} baud unsupported, using {}", other, DEFAULT_MIDI_BAUD);
            Baudrate::BAUD31250
        }
    }
}

/// Feed serial MIDI into the selection until it is confirmed.
pub async fn read_midi(
    mut rx: UarteRxWithIdle<'static, UARTE0, TIMER0>,
    selection: &Selection,
    normalizer: &Normalizer,
) {
    let mut parser = MidiParser::new(Transport::Serial);
    let mut buf = [0u8; SERIAL_READ_CHUNK];

    info!("Serial MIDI task started");

    loop {
        if selection.is_confirmed() {
            info!("Serial MIDI: selection confirmed, stopping");
            return;
        }

        let n = match rx.read_until_idle(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("Serial MIDI: read failed: {}", e);
                continue;
            }
        };

        for event in parser.feed(&buf[..n]) {
            submit_event(selection, normalizer, RawEvent::Midi(event));
        }
    }
}
