//! Button edge detection with a per-pin debounce window.
//!
//! The poll loop samples each pin every iteration and reports whether it
//! is currently pressed (active-low pins read LOW). A press is accepted on
//! the released→pressed transition only, and only when at least the
//! debounce window has elapsed since the last accepted press on that pin.
//! Holding a button does not repeat.

use super::Button;

#[derive(Clone, Copy, Debug, Default)]
struct PinState {
    pressed: bool,
    last_accepted_ms: Option<u64>,
}

/// Debounced edge detector for the three selector buttons.
#[derive(Clone, Debug)]
pub struct ButtonPoller {
    debounce_ms: u64,
    pins: [PinState; 3],
}

impl ButtonPoller {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            pins: [PinState::default(); 3],
        }
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// Feed one sample. Returns the button if this sample is an accepted press.
    pub fn sample(&mut self, button: Button, pressed: bool, now_ms: u64) -> Option<Button> {
        let pin = &mut self.pins[button.slot()];
        let was_pressed = core::mem::replace(&mut pin.pressed, pressed);

        if !pressed || was_pressed {
            return None;
        }

        if let Some(last) = pin.last_accepted_ms {
            if now_ms.saturating_sub(last) < self.debounce_ms {
                #[cfg(feature = "defmt")]
                defmt::debug!("Button {}: bounce at {} ms ignored", button, now_ms);
                return None;
            }
        }

        pin.last_accepted_ms = Some(now_ms);
        Some(button)
    }
}
