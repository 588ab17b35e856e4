//! USB Device subsystem - presents a class-compliant MIDI device to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. A single USB-MIDI interface receives controller input
//! from the host; the MIDI task splits each bulk transfer into 4-byte
//! event packets and feeds their payload to the USB reassembler.

pub mod midi_device;
