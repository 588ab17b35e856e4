//! USB-MIDI device.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and exposes one MIDI streaming interface.

use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_usb::class::midi::MidiClass;
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Config};
use static_cell::StaticCell;

use multisynth::config;
use multisynth::input::Normalizer;
use multisynth::midi::packets;
use multisynth::{MidiParser, RawEvent, Transport};

use crate::{submit_event, Selection};

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

type UsbDriver = Driver<'static, peripherals::USBD, HardwareVbusDetect>;

pub type UsbDevice = embassy_usb::UsbDevice<'static, UsbDriver>;
pub type UsbMidiClass = MidiClass<'static, UsbDriver>;

static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();

/// Build result containing the USB device runner and the MIDI class.
pub struct UsbMidiDevice {
    pub device: UsbDevice,
    pub class: UsbMidiClass,
}

/// Initialise the USB stack and create the MIDI device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD) -> UsbMidiDevice {
    // Create the low-level USB driver with hardware VBUS detection.
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    // Allocate static descriptor buffers.
    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 256]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    // One IN jack (host → selector), one OUT jack so hosts list the port.
    let class = MidiClass::new(&mut builder, 1, 1, config::USB_MIDI_MAX_PACKET_SIZE);

    let device = builder.build();

    info!("USB MIDI device initialised");

    UsbMidiDevice { device, class }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
///
/// This handles USB enumeration, suspend/resume, and endpoint servicing.
pub async fn run_usb_device(mut device: UsbDevice) -> ! {
    info!("USB device task started");
    device.run().await
}

/// Feed USB MIDI into the selection until it is confirmed.
///
/// A disconnect parks the task until the host enumerates the device again.
pub async fn read_midi(mut class: UsbMidiClass, selection: &Selection, normalizer: &Normalizer) {
    let mut parser = MidiParser::new(Transport::Usb);
    let mut buf = [0u8; config::USB_MIDI_MAX_PACKET_SIZE as usize];

    loop {
        class.wait_connection().await;
        info!("USB MIDI: host connected");

        loop {
            if selection.is_confirmed() {
                info!("USB MIDI: selection confirmed, stopping");
                return;
            }

            let n = match class.read_packet(&mut buf).await {
                Ok(n) => n,
                Err(EndpointError::Disabled) => break,
                Err(EndpointError::BufferOverflow) => {
                    warn!("USB MIDI: transfer larger than buffer dropped");
                    continue;
                }
            };

            for packet in packets(&buf[..n]) {
                for event in parser.feed(packet.payload()) {
                    submit_event(selection, normalizer, RawEvent::Midi(event));
                }
            }
        }

        info!("USB MIDI: host disconnected");
    }
}
