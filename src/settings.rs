//! Runtime settings - pins, MIDI bindings and debounce.
//!
//! Defaults are compiled in. On the device an optional properties blob is
//! read from flash at start-up and applied on top:
//!
//! ```text
//! # multisynth.ini
//! ButtonPinPrev=5
//! MIDIButtonNext=0x2F
//! MIDINote1=36
//! ```
//!
//! Keys follow the names used by the synth images' own configuration files,
//! so the same file can be shared.

use heapless::Vec;

use crate::config::{DEFAULT_DEBOUNCE_MS, DEFAULT_MIDI_BAUD, MAX_OPTIONS};
use crate::error::{Error, SettingError};
use crate::input::MidiBindings;

/// Highest GPIO number (P1.15 on the nRF52840).
const MAX_PIN: u8 = 47;
const MAX_MIDI_VALUE: u8 = 127;

/// Start-up configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub button_pin_prev: u8,
    pub button_pin_next: u8,
    pub button_pin_select: u8,

    pub encoder_enabled: bool,
    pub encoder_pin_clock: u8,
    pub encoder_pin_data: u8,
    pub encoder_pin_switch: u8,

    pub midi_baud: u32,
    pub midi_next_cc: u8,
    pub midi_prev_cc: u8,
    pub midi_select_cc: u8,
    /// One note per option, in option order.
    pub midi_notes: Vec<u8, MAX_OPTIONS>,

    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let mut midi_notes = Vec::new();
        for note in [36, 38, 40] {
            // Capacity is MAX_OPTIONS, well above three.
            let _ = midi_notes.push(note);
        }

        Self {
            button_pin_prev: 5,
            button_pin_next: 6,
            button_pin_select: 13,
            encoder_enabled: false,
            encoder_pin_clock: 10,
            encoder_pin_data: 9,
            encoder_pin_switch: 11,
            midi_baud: DEFAULT_MIDI_BAUD,
            midi_next_cc: 47,
            midi_prev_cc: 46,
            midi_select_cc: 49,
            midi_notes,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Settings {
    /// Apply `Key=Value` lines on top of the current values.
    ///
    /// Blank lines, `#`/`;` comments and `[section]` headers are skipped,
    /// as are unknown keys. Returns the number of keys applied. Stops at
    /// the first bad line; keys before it stay applied.
    pub fn apply_properties(&mut self, text: &str) -> Result<usize, Error> {
        let mut applied = 0;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with(';')
                || line.starts_with('[')
            {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or(SettingError::MalformedLine)?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() {
                return Err(SettingError::MalformedLine.into());
            }

            match self.apply(key, value) {
                Ok(true) => applied += 1,
                Ok(false) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Settings: unknown key {=str} ignored", key);
                }
                Err(e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Settings: {=str} rejected: {}", key, e);
                    return Err(e.into());
                }
            }
        }

        Ok(applied)
    }

    /// The MIDI bindings the normalizer should use.
    pub fn midi_bindings(&self) -> MidiBindings {
        MidiBindings {
            next_cc: self.midi_next_cc,
            prev_cc: self.midi_prev_cc,
            select_cc: self.midi_select_cc,
            notes: self.midi_notes.clone(),
        }
    }

    /// Returns `Ok(false)` for keys this device does not use.
    fn apply(&mut self, key: &str, value: &str) -> Result<bool, SettingError> {
        match key {
            "ButtonPinPrev" => self.button_pin_prev = parse_pin(value)?,
            "ButtonPinNext" => self.button_pin_next = parse_pin(value)?,
            "ButtonPinSelect" => self.button_pin_select = parse_pin(value)?,
            "EncoderEnabled" => self.encoder_enabled = parse_number(value)? != 0,
            "EncoderPinClock" => self.encoder_pin_clock = parse_pin(value)?,
            "EncoderPinData" => self.encoder_pin_data = parse_pin(value)?,
            "EncoderPinSwitch" => self.encoder_pin_switch = parse_pin(value)?,
            "MIDIBaudRate" => {
                self.midi_baud =
                    u32::try_from(parse_number(value)?).map_err(|_| SettingError::NotANumber)?
            }
            "MIDIButtonNext" => self.midi_next_cc = parse_midi(value)?,
            "MIDIButtonPrev" => self.midi_prev_cc = parse_midi(value)?,
            "MIDIButtonSelect" => self.midi_select_cc = parse_midi(value)?,
            "DebounceMs" => self.debounce_ms = parse_number(value)?,
            _ => match key.strip_prefix("MIDINote") {
                Some(slot) => {
                    let slot = parse_number(slot).map_err(|_| SettingError::NoteSlotOutOfRange)?;
                    let note = parse_midi(value)?;
                    self.set_note(slot, note)?;
                }
                None => return Ok(false),
            },
        }
        Ok(true)
    }

    /// `slot` is 1-based. Slots must be filled in order; a slot one past
    /// the end appends.
    fn set_note(&mut self, slot: u64, note: u8) -> Result<(), SettingError> {
        let index = usize::try_from(slot)
            .ok()
            .and_then(|s| s.checked_sub(1))
            .ok_or(SettingError::NoteSlotOutOfRange)?;

        if let Some(existing) = self.midi_notes.get_mut(index) {
            *existing = note;
            Ok(())
        } else if index == self.midi_notes.len() {
            self.midi_notes
                .push(note)
                .map_err(|_| SettingError::NoteSlotOutOfRange)
        } else {
            Err(SettingError::NoteSlotOutOfRange)
        }
    }
}

fn parse_number(value: &str) -> Result<u64, SettingError> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| SettingError::NotANumber)
}

fn parse_midi(value: &str) -> Result<u8, SettingError> {
    match parse_number(value)? {
        v if v <= MAX_MIDI_VALUE as u64 => Ok(v as u8),
        _ => Err(SettingError::MidiOutOfRange),
    }
}

fn parse_pin(value: &str) -> Result<u8, SettingError> {
    match parse_number(value)? {
        v if v <= MAX_PIN as u64 => Ok(v as u8),
        _ => Err(SettingError::PinOutOfRange),
    }
}
