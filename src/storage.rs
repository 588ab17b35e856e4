//! Persistent settings blob.
//!
//! Uses the nRF52840's internal flash via `sequential-storage` crate to
//! hold an optional properties file (see [`multisynth::settings`]) that
//! overrides the compiled-in defaults.
//!
//! Storage layout:
//!   - One map item, key `0x01`, holding the UTF-8 properties text.
//!   - The flash pages are managed by `sequential-storage` which handles
//!     wear levelling and GC; the selector only ever reads.

use defmt::{error, info, warn};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_nrf::nvmc::Nvmc;
use embedded_storage_async::nor_flash::NorFlash;

use multisynth::config::{MAX_SETTINGS_BLOB, STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use multisynth::{Error, Settings};

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key for the properties blob in the map storage.
const KEY_SETTINGS: u8 = 0x01;

/// The on-chip flash controller behind the async NOR flash interface.
pub type Flash = BlockingAsync<Nvmc<'static>>;

/// Owns the flash until the selector hands off.
pub struct SettingsStore<F: NorFlash> {
    flash: Option<F>,
}

impl<F: NorFlash> SettingsStore<F> {
    pub fn new(flash: F) -> Self {
        Self { flash: Some(flash) }
    }

    /// Defaults with the stored properties applied on top.
    ///
    /// A missing, unreadable or malformed blob is logged and leaves the
    /// affected values at their defaults.
    pub async fn load(&mut self) -> Settings {
        let mut settings = Settings::default();
        let Some(flash) = self.flash.as_mut() else {
            warn!("Settings: storage already released, using defaults");
            return settings;
        };

        let mut buf = [0u8; MAX_SETTINGS_BLOB];
        match sequential_storage::map::fetch_item::<u8, &[u8], _>(
            flash,
            STORAGE_START..STORAGE_END,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_SETTINGS,
        )
        .await
        {
            Ok(Some(data)) => match core::str::from_utf8(data) {
                Ok(text) => match settings.apply_properties(text) {
                    Ok(applied) => info!("Settings: {} keys loaded from flash", applied),
                    Err(e) => warn!("Settings: stopped at bad entry: {}", e),
                },
                Err(_) => warn!("Settings: blob is not UTF-8, using defaults"),
            },
            Ok(None) => info!("Settings: none stored, using defaults"),
            Err(e) => error!("Flash read error: {:?}", defmt::Debug2Format(&e)),
        }

        settings
    }

    /// Release the flash controller. Fails if it was already released.
    pub fn unmount(&mut self) -> Result<(), Error> {
        match self.flash.take() {
            Some(_flash) => {
                info!("Settings storage released");
                Ok(())
            }
            None => Err(Error::Storage),
        }
    }
}
