//! User interface subsystem - OLED display + physical controls.
//!
//! Input tasks turn pin activity into [`multisynth::RawEvent`]s and submit
//! them through the shared selection. The display is redrawn only by the
//! main task, which owns it.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×64 OLED via I²C
//! - **Buttons**: 3 tactile switches, polled and debounced (PREV, NEXT, SELECT)
//! - **Encoder**: quadrature rotary encoder with push switch (optional)

pub mod buttons;
pub mod display;
pub mod encoder;
