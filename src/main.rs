//! multisynth firmware for the nRF52840.
//!
//! Shows the available synth images on an SSD1306 OLED, lets the user
//! pick one with buttons, a rotary encoder, or MIDI (DIN serial or USB),
//! then tears the board down and jumps into the chosen image.
//!
//! ## Tasks
//!
//! - `buttons`: polls PREV / NEXT / SELECT every `POLL_INTERVAL_MS`
//! - `encoder` + `encoder_switch`: QDEC rotation and push switch (optional)
//! - `serial_midi`: UARTE byte stream → serial reassembler
//! - `usb_device` + `usb_midi`: USB-MIDI packets → USB reassembler
//! - `main`: owns the display and flash, redraws on selection changes
//!   and runs the boot dispatcher once a selection is confirmed
//!
//! Every input task submits through the same [`SharedSelection`].

#![no_std]
#![no_main]

mod boot;
mod serial;
mod storage;
mod ui;
mod usb;

use defmt::{info, unwrap, warn};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::AnyPin;
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::peripherals::{QDEC, TIMER0, UARTE0};
use embassy_nrf::qdec::{self, Qdec};
use embassy_nrf::uarte::{self, UarteRx, UarteRxWithIdle};
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use static_cell::StaticCell;

use multisynth::config::DEFAULT_OPTIONS;
use multisynth::input::Normalizer;
use multisynth::{
    BootDispatcher, OptionList, RawEvent, SelectionObserver, SharedSelection, Shutdown, SynthOption,
};

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    UARTE0 => uarte::InterruptHandler<peripherals::UARTE0>;
    QDEC => qdec::InterruptHandler<peripherals::QDEC>;
});

/// Selection shared by every input task and the main task.
pub type Selection = SharedSelection<'static, CriticalSectionRawMutex, SignalObserver>;

/// Highlighted index to redraw.
static DISPLAY_SIGNAL: Signal<CriticalSectionRawMutex, usize> = Signal::new();

/// Confirmed index; wakes the main task to boot.
static BOOT_SIGNAL: Signal<CriticalSectionRawMutex, usize> = Signal::new();

static SELECTION: StaticCell<Selection> = StaticCell::new();

/// Forwards selection notifications to the main task.
pub struct SignalObserver;

impl SelectionObserver for SignalObserver {
    fn selection_changed(&self, index: usize, _option: &SynthOption) {
        DISPLAY_SIGNAL.signal(index);
    }

    fn confirmed(&self, index: usize, _option: &SynthOption) {
        BOOT_SIGNAL.signal(index);
    }
}

/// Normalize one raw event and hand the intent to the selection.
pub fn submit_event(selection: &Selection, normalizer: &Normalizer, event: RawEvent) {
    if let Some(intent) = normalizer.normalize(event) {
        defmt::debug!("Intent: {}", intent);
        selection.submit(intent);
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("multisynth starting");

    let p = embassy_nrf::init(Default::default());

    // Display first, so the user sees something while settings load.
    let mut twim_config = twim::Config::default();
    twim_config.frequency = twim::Frequency::K400;
    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim_config);
    let mut display = ui::display::init(i2c);
    ui::display::draw_loading(&mut display);

    // Settings
    let flash = BlockingAsync::new(Nvmc::new(p.NVMC));
    let mut store = storage::SettingsStore::new(flash);
    let settings = store.load().await;

    let options = match OptionList::new(&DEFAULT_OPTIONS) {
        Ok(options) => options,
        Err(e) => defmt::panic!("Option table rejected: {}", e),
    };
    let selection: &'static Selection =
        SELECTION.init(SharedSelection::new(options, SignalObserver));
    let normalizer = Normalizer::new(settings.midi_bindings());

    // Buttons
    // SAFETY: pin numbers come from settings and are not used elsewhere;
    // the fixed I²C, UART and USB pins are outside the configurable set.
    let buttons = unsafe {
        [
            AnyPin::steal(settings.button_pin_prev),
            AnyPin::steal(settings.button_pin_next),
            AnyPin::steal(settings.button_pin_select),
        ]
    };
    unwrap!(spawner.spawn(buttons_task(
        buttons,
        selection,
        normalizer.clone(),
        settings.debounce_ms
    )));

    // Encoder
    if settings.encoder_enabled {
        // SAFETY: as for the buttons.
        let (clock, data, switch) = unsafe {
            (
                AnyPin::steal(settings.encoder_pin_clock),
                AnyPin::steal(settings.encoder_pin_data),
                AnyPin::steal(settings.encoder_pin_switch),
            )
        };
        let qdec = Qdec::new(p.QDEC, Irqs, clock, data, qdec::Config::default());
        unwrap!(spawner.spawn(encoder_task(qdec, selection, normalizer.clone())));
        unwrap!(spawner.spawn(encoder_switch_task(
            switch,
            selection,
            normalizer.clone(),
            settings.debounce_ms
        )));
    } else {
        info!("Encoder disabled");
    }

    // Serial MIDI
    let mut uart_config = uarte::Config::default();
    uart_config.baudrate = serial::baudrate(settings.midi_baud);
    let rx = UarteRx::new(p.UARTE0, Irqs, p.P0_08, uart_config).with_idle(
        p.TIMER0,
        p.PPI_CH0,
        p.PPI_CH1,
    );
    unwrap!(spawner.spawn(serial_midi_task(rx, selection, normalizer.clone())));

    // USB MIDI
    let usb = usb::midi_device::init(p.USBD);
    unwrap!(spawner.spawn(usb_device_task(usb.device)));
    unwrap!(spawner.spawn(usb_midi_task(usb.class, selection, normalizer)));

    // Browse until confirmed.
    let (index, _) = selection.current();
    ui::display::draw_selection(&mut display, selection.options(), index);

    loop {
        match select(DISPLAY_SIGNAL.wait(), BOOT_SIGNAL.wait()).await {
            Either::First(index) => {
                ui::display::draw_selection(&mut display, selection.options(), index)
            }
            Either::Second(_) => break,
        }
    }

    let Some(target) = selection.boot_target() else {
        defmt::panic!("Boot signalled without a confirmed selection");
    };
    ui::display::draw_launching(&mut display, target.option().display_name);

    let board = boot::Board::new(display, store);
    match BootDispatcher::new(board, boot::ImageHandoff).dispatch(target) {
        Shutdown::Reboot => {
            info!("Resetting into staged image");
            cortex_m::peripheral::SCB::sys_reset();
        }
        Shutdown::Halt => {
            warn!("Halted - power cycle to return to the selector");
            loop {
                cortex_m::asm::wfi();
            }
        }
    }
}

#[embassy_executor::task]
async fn buttons_task(
    pins: [AnyPin; 3],
    selection: &'static Selection,
    normalizer: Normalizer,
    debounce_ms: u64,
) {
    ui::buttons::poll_buttons(pins, selection, &normalizer, debounce_ms).await
}

#[embassy_executor::task]
async fn encoder_task(
    qdec: Qdec<'static, QDEC>,
    selection: &'static Selection,
    normalizer: Normalizer,
) {
    ui::encoder::read_rotation(qdec, selection, &normalizer).await
}

#[embassy_executor::task]
async fn encoder_switch_task(
    pin: AnyPin,
    selection: &'static Selection,
    normalizer: Normalizer,
    debounce_ms: u64,
) {
    ui::encoder::read_switch(pin, selection, &normalizer, debounce_ms).await
}

#[embassy_executor::task]
async fn serial_midi_task(
    rx: UarteRxWithIdle<'static, UARTE0, TIMER0>,
    selection: &'static Selection,
    normalizer: Normalizer,
) {
    serial::read_midi(rx, selection, &normalizer).await
}

#[embassy_executor::task]
async fn usb_device_task(device: usb::midi_device::UsbDevice) -> ! {
    usb::midi_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn usb_midi_task(
    class: usb::midi_device::UsbMidiClass,
    selection: &'static Selection,
    normalizer: Normalizer,
) {
    usb::midi_device::read_midi(class, selection, &normalizer).await
}
