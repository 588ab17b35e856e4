//! GPIO button input with polled debouncing.
//!
//! Three physical buttons (active-low with internal pull-up):
//!   - PREV   - highlight the previous synth
//!   - NEXT   - highlight the next synth
//!   - SELECT - launch the highlighted synth
//!
//! All three pins are sampled on one ticker. [`ButtonPoller`] decides which
//! samples are accepted presses, so a held button fires once.

use defmt::info;
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Instant, Ticker};

use multisynth::config::POLL_INTERVAL_MS;
use multisynth::input::{ButtonPoller, Normalizer};
use multisynth::{Button, RawEvent};

use crate::{submit_event, Selection};

/// Poll the PREV / NEXT / SELECT pins until the selection is confirmed.
pub async fn poll_buttons(
    pins: [AnyPin; 3],
    selection: &Selection,
    normalizer: &Normalizer,
    debounce_ms: u64,
) {
    let [prev, next, select] = pins;
    let inputs = [
        (Button::Previous, Input::new(prev, Pull::Up)),
        (Button::Next, Input::new(next, Pull::Up)),
        (Button::Select, Input::new(select, Pull::Up)),
    ];

    let mut poller = ButtonPoller::new(debounce_ms);
    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));

    loop {
        if selection.is_confirmed() {
            info!("Buttons: selection confirmed, stopping");
            return;
        }

        let now = Instant::now().as_millis();
        for (button, input) in &inputs {
            if let Some(pressed) = poller.sample(*button, input.is_low(), now) {
                info!("Button: {}", pressed);
                submit_event(selection, normalizer, RawEvent::Button(pressed));
            }
        }

        ticker.next().await;
    }
}
