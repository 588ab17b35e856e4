//! Board teardown and the jump into a synth image.
//!
//! Each image is linked to run from its own flash slot (see
//! `config::BOOT_IMAGES`) and starts with a standard Cortex-M vector
//! table: initial stack pointer, then reset vector.

use defmt::{info, warn};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::twim::Twim;

use multisynth::config::{BOOT_IMAGES, FLASH_END, RAM_END, RAM_START};
use multisynth::{release_all, Error, Handoff, Release, SynthOption, Teardown};

use crate::storage::{Flash, SettingsStore};
use crate::ui::display::{self, Display};

/// Number of NVIC enable/pending register words on the nRF52840.
const NVIC_WORDS: usize = 8;

// Register blocks of peripherals whose drivers are owned by input tasks.
// Those tasks never return their drivers, so teardown stops the hardware
// directly.
const UARTE0_BASE: u32 = 0x4000_2000;
const TWIM0_BASE: u32 = 0x4000_3000;
const GPIOTE_BASE: u32 = 0x4000_6000;
const TIMER0_BASE: u32 = 0x4000_8000;
const QDEC_BASE: u32 = 0x4001_2000;
const PPI_BASE: u32 = 0x4001_F000;
const USBD_BASE: u32 = 0x4002_7000;

const TASKS_STOP: u32 = 0x004;
const UARTE_TASKS_STOPTX: u32 = 0x00C;
const UARTE_EVENTS_RXTO: u32 = 0x144;
const INTENCLR: u32 = 0x308;
const ENABLE: u32 = 0x500;
const PPI_CHENCLR: u32 = 0x508;
const GPIOTE_CONFIG: u32 = 0x510;
const GPIOTE_CHANNELS: u32 = 8;
const USBD_USBPULLUP: u32 = 0x504;

/// PPI channels 0 and 1 carry the UARTE idle timer.
const SERIAL_PPI_CHANNELS: u32 = 0b11;

/// Polls of `EVENTS_RXTO` before the receiver is given up on.
const RX_STOP_SPINS: u32 = 100_000;

unsafe fn write_reg(base: u32, offset: u32, value: u32) {
    ((base + offset) as *mut u32).write_volatile(value);
}

unsafe fn read_reg(base: u32, offset: u32) -> u32 {
    ((base + offset) as *const u32).read_volatile()
}

/// Peripherals the selector owns until hand-off.
pub struct Board {
    screen: Screen,
    store: SettingsStore<Flash>,
}

impl Board {
    pub fn new(display: Display<Twim<'static, TWISPI0>>, store: SettingsStore<Flash>) -> Self {
        Self {
            screen: Screen { display },
            store,
        }
    }
}

impl Teardown for Board {
    fn release_peripherals(&mut self) -> Result<(), Error> {
        // Interrupts go first so no driver handler runs on a half-stopped
        // peripheral.
        release_all(&mut [
            &mut Interrupts,
            &mut self.screen,
            &mut SerialMidi,
            &mut Encoder,
            &mut UsbMidi,
        ])
    }

    fn unmount_storage(&mut self) -> Result<(), Error> {
        self.store.unmount()
    }
}

struct Interrupts;

impl Release for Interrupts {
    fn name(&self) -> &'static str {
        "interrupts"
    }

    fn release(&mut self) -> Result<(), Error> {
        // SAFETY: the executor is not polled again before the hand-off.
        unsafe { mask_all_interrupts() };
        Ok(())
    }
}

struct Screen {
    display: Display<Twim<'static, TWISPI0>>,
}

impl Release for Screen {
    fn name(&self) -> &'static str {
        "display"
    }

    fn release(&mut self) -> Result<(), Error> {
        let blanked = display::power_off(&mut self.display);
        // SAFETY: TWIM0 is idle once the blocking flush above has returned.
        unsafe { write_reg(TWIM0_BASE, ENABLE, 0) };
        blanked
    }
}

/// UARTE0 receiver plus the TIMER0/PPI idle detector.
struct SerialMidi;

impl Release for SerialMidi {
    fn name(&self) -> &'static str {
        "serial MIDI"
    }

    fn release(&mut self) -> Result<(), Error> {
        // SAFETY: the serial task is no longer polled; it owned these blocks.
        unsafe {
            write_reg(UARTE0_BASE, UARTE_EVENTS_RXTO, 0);
            write_reg(UARTE0_BASE, INTENCLR, 0xFFFF_FFFF);
            write_reg(UARTE0_BASE, TASKS_STOP, 1);
            write_reg(UARTE0_BASE, UARTE_TASKS_STOPTX, 1);

            let stopped =
                (0..RX_STOP_SPINS).any(|_| read_reg(UARTE0_BASE, UARTE_EVENTS_RXTO) != 0);

            write_reg(UARTE0_BASE, ENABLE, 0);
            write_reg(TIMER0_BASE, TASKS_STOP, 1);
            write_reg(PPI_BASE, PPI_CHENCLR, SERIAL_PPI_CHANNELS);

            if stopped {
                Ok(())
            } else {
                Err(Error::Serial)
            }
        }
    }
}

/// QDEC plus the GPIOTE channels used by the encoder switch.
struct Encoder;

impl Release for Encoder {
    fn name(&self) -> &'static str {
        "encoder"
    }

    fn release(&mut self) -> Result<(), Error> {
        // SAFETY: the encoder tasks are no longer polled. Writes to a QDEC
        // that was never enabled are harmless.
        unsafe {
            write_reg(QDEC_BASE, INTENCLR, 0xFFFF_FFFF);
            write_reg(QDEC_BASE, TASKS_STOP, 1);
            write_reg(QDEC_BASE, ENABLE, 0);

            write_reg(GPIOTE_BASE, INTENCLR, 0xFFFF_FFFF);
            for channel in 0..GPIOTE_CHANNELS {
                write_reg(GPIOTE_BASE, GPIOTE_CONFIG + 4 * channel, 0);
            }
        }
        Ok(())
    }
}

struct UsbMidi;

impl Release for UsbMidi {
    fn name(&self) -> &'static str {
        "USB"
    }

    fn release(&mut self) -> Result<(), Error> {
        // SAFETY: the USB tasks are no longer polled. Dropping the pull-up
        // detaches from the host before the controller goes off.
        unsafe {
            write_reg(USBD_BASE, INTENCLR, 0xFFFF_FFFF);
            write_reg(USBD_BASE, USBD_USBPULLUP, 0);
            write_reg(USBD_BASE, ENABLE, 0);
        }
        Ok(())
    }
}

/// Jumps straight into the image; never stages.
pub struct ImageHandoff;

impl Handoff for ImageHandoff {
    fn boot(&mut self, option: &SynthOption) -> Result<(), Error> {
        let base = image_address(option.boot_key)?;
        let vt = validate_image(base)?;
        info!(
            "Jumping to {} at {:#x} (sp {:#x}, reset {:#x})",
            option.boot_key, base, vt.initial_sp, vt.reset_vector
        );

        // SAFETY: the vector table was validated above and every
        // interrupt line is disabled before control leaves the selector.
        unsafe { start_image(base, &vt) }
    }
}

fn image_address(boot_key: &str) -> Result<u32, Error> {
    BOOT_IMAGES
        .iter()
        .find(|(key, _)| *key == boot_key)
        .map(|&(_, addr)| addr)
        .ok_or_else(|| {
            warn!("No image registered for {}", boot_key);
            Error::ImageNotFound
        })
}

struct VectorTable {
    initial_sp: u32,
    reset_vector: u32,
}

impl VectorTable {
    unsafe fn read_from(addr: u32) -> Self {
        Self {
            initial_sp: (addr as *const u32).read_volatile(),
            reset_vector: (addr as *const u32).offset(1).read_volatile(),
        }
    }

    fn is_valid_for(&self, base: u32) -> bool {
        // Thumb bit must be set; the handler itself must lie past the table.
        let entry = self.reset_vector & !1;
        (RAM_START..=RAM_END).contains(&self.initial_sp)
            && self.reset_vector & 1 == 1
            && (base..FLASH_END).contains(&entry)
    }
}

fn validate_image(base: u32) -> Result<VectorTable, Error> {
    // SAFETY: every BOOT_IMAGES address lies inside on-chip flash.
    let vt = unsafe { VectorTable::read_from(base) };
    if vt.is_valid_for(base) {
        Ok(vt)
    } else {
        warn!(
            "Image at {:#x} not bootable (sp {:#x}, reset {:#x})",
            base, vt.initial_sp, vt.reset_vector
        );
        Err(Error::InvalidImage)
    }
}

/// Disable and clear every NVIC line with PRIMASK set.
unsafe fn mask_all_interrupts() {
    cortex_m::interrupt::disable();

    let nvic = &*cortex_m::peripheral::NVIC::PTR;
    for word in 0..NVIC_WORDS {
        nvic.icer[word].write(0xFFFF_FFFF);
        nvic.icpr[word].write(0xFFFF_FFFF);
    }
}

unsafe fn start_image(base: u32, vt: &VectorTable) -> ! {
    // Peripherals may have raised events since teardown.
    mask_all_interrupts();

    let syst = &*cortex_m::peripheral::SYST::PTR;
    syst.csr.write(0);

    let scb = &*cortex_m::peripheral::SCB::PTR;
    scb.vtor.write(base);

    cortex_m::asm::dsb();
    cortex_m::asm::isb();

    // Images expect the reset state: PRIMASK clear, every line disabled.
    cortex_m::interrupt::enable();

    core::arch::asm!(
        "msr msp, {sp}",
        "bx {reset}",
        sp = in(reg) vt.initial_sp,
        reset = in(reg) vt.reset_vector,
        options(noreturn)
    );
}
