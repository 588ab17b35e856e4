//! Rotary encoder input.
//!
//! Rotation is decoded by the QDEC peripheral; each step is one
//! clockwise or counter-clockwise event. The push switch is a separate
//! active-low pin handled on its own edge.

use defmt::{debug, info};
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_nrf::peripherals::QDEC;
use embassy_nrf::qdec::Qdec;
use embassy_time::{Duration, Timer};

use multisynth::input::Normalizer;
use multisynth::{EncoderEvent, RawEvent};

use crate::{submit_event, Selection};

/// Turn QDEC samples into rotation events until the selection is confirmed.
pub async fn read_rotation(
    mut qdec: Qdec<'static, QDEC>,
    selection: &Selection,
    normalizer: &Normalizer,
) {
    loop {
        let steps = qdec.read().await;
        if selection.is_confirmed() {
            info!("Encoder: selection confirmed, stopping");
            return;
        }

        let event = if steps > 0 {
            EncoderEvent::Clockwise
        } else {
            EncoderEvent::CounterClockwise
        };
        debug!("Encoder: {} steps", steps);

        for _ in 0..steps.unsigned_abs() {
            submit_event(selection, normalizer, RawEvent::Encoder(event));
        }
    }
}

/// Wait for encoder switch presses until the selection is confirmed.
pub async fn read_switch(
    pin: AnyPin,
    selection: &Selection,
    normalizer: &Normalizer,
    debounce_ms: u64,
) {
    let mut switch = Input::new(pin, Pull::Up);

    loop {
        switch.wait_for_falling_edge().await;
        if selection.is_confirmed() {
            return;
        }

        // Debounce: wait and re-check.
        Timer::after(Duration::from_millis(debounce_ms)).await;

        if switch.is_low() {
            info!("Encoder: click");
            submit_event(selection, normalizer, RawEvent::Encoder(EncoderEvent::Click));

            // Wait for release to avoid repeat triggers.
            switch.wait_for_rising_edge().await;
        }
    }
}
