//! Application-wide constants and compile-time configuration.
//!
//! All hardware-independent limits, timing parameters, flash layout and
//! the default option table live here so they can be tuned in one place.
//! Values that the user may change at runtime (pins, MIDI bindings,
//! debounce) have their defaults in [`crate::settings`].

use crate::selector::SynthOption;

// Options

/// Upper bound on the number of selectable firmware images.
pub const MAX_OPTIONS: usize = 8;

/// The firmware images offered on this board.
pub const DEFAULT_OPTIONS: [SynthOption; 3] = [
    SynthOption::new("MiniDexed", "minidexed"),
    SynthOption::new("MiniJV880", "minijv880"),
    SynthOption::new("MT-32Pi", "mt32pi"),
];

/// Characters in one display line (128 px / 6 px font = 21).
pub const LABEL_CAPACITY: usize = 21;

/// Flash address of the vector table for each boot key.
pub const BOOT_IMAGES: [(&str, u32); 3] = [
    ("minidexed", 0x0002_0000),
    ("minijv880", 0x0006_0000),
    ("mt32pi", 0x000A_0000),
];

/// RAM window an image's initial stack pointer must fall into.
pub const RAM_START: u32 = 0x2000_0000;
pub const RAM_END: u32 = 0x2004_0000;

/// Flash window an image's reset vector must fall into.
pub const FLASH_END: u32 = 0x0010_0000;

// Input

/// Main input poll period (ms).
pub const POLL_INTERVAL_MS: u64 = 10;

/// Button debounce window used when settings do not override it (ms).
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

// MIDI

/// Bytes a reassembler can hold for one Channel-Voice message.
pub const MIDI_MESSAGE_CAPACITY: usize = 3;

/// Serial read chunk size per loop iteration.
pub const SERIAL_READ_CHUNK: usize = 64;

/// Default MIDI DIN baud rate.
pub const DEFAULT_MIDI_BAUD: u32 = 31_250;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "multisynth";
pub const USB_PRODUCT: &str = "Multisynth Selector";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB MIDI bulk endpoint max packet size.
pub const USB_MIDI_MAX_PACKET_SIZE: u16 = 64;

// Settings storage

/// Flash page index where settings storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for settings storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;

/// Largest settings properties blob we read back from flash.
pub const MAX_SETTINGS_BLOB: usize = 512;
