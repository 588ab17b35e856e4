//! Unified error type for multisynth.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (with the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Selection
    /// The option table has no entries; at least one is required.
    NoOptions,

    // Settings
    /// A settings entry could not be applied.
    InvalidSetting(SettingError),

    // Peripherals
    /// I²C transaction to the display failed.
    Display,

    /// Flash read/write/erase failed.
    Storage,

    /// The UART receiver did not stop in time.
    Serial,

    // Hand-off
    /// No boot image is registered for the requested key.
    ImageNotFound,

    /// The image's vector table does not describe a bootable image.
    InvalidImage,
}

/// Why a settings entry was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingError {
    /// Line is not of the form `Key=Value`.
    MalformedLine,
    /// Value is not a decimal (or `0x` hex) unsigned integer.
    NotANumber,
    /// MIDI controller or note number above 127.
    MidiOutOfRange,
    /// `MIDINoteN` has no room in the note table: slot 0, a gap past its
    /// end, or a slot above `config::MAX_OPTIONS`.
    ///
    /// Slots are not checked against the option list; a note bound past
    /// its end is ignored when it arrives.
    NoteSlotOutOfRange,
    /// Pin number does not fit the GPIO numbering.
    PinOutOfRange,
}

// Convenience conversions

impl From<SettingError> for Error {
    fn from(e: SettingError) -> Self {
        Error::InvalidSetting(e)
    }
}
