//! Persistent preset storage.
//!
//! The action engine sees non-volatile memory as a flat 512-byte array
//! (16 presets x 32 bytes) with single-byte get/put, the same contract
//! an EEPROM would give. On the nRF52840 there is no EEPROM, so
//! `PresetStore` keeps a RAM shadow of the whole area and syncs it with
//! internal flash via the `sequential-storage` crate, which handles
//! wear levelling and GC over the reserved pages.
//!
//! Writes land in the shadow immediately (the engine's view is always
//! current); the embedded shell flushes the shadow to flash whenever
//! the dirty flag is set. A multi-byte record update flushed mid-way
//! is observable as a partially-updated preset, by contract.

use crate::config::STORE_SIZE;

#[cfg(feature = "embedded")]
use crate::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
#[cfg(feature = "embedded")]
use defmt::{debug, error, info};

/// Byte-addressable non-volatile store, 512 bytes.
///
/// Addresses are masked into range by the caller (configuration
/// targets are always masked, never rejected), but the store itself
/// also wraps out-of-range addresses rather than panicking.
pub trait NvStore {
    /// Read one byte at an absolute offset.
    fn read_byte(&self, addr: u16) -> u8;

    /// Write one byte at an absolute offset. Takes effect immediately
    /// for subsequent reads; durability is a separate flush concern.
    fn write_byte(&mut self, addr: u16, value: u8);
}

/// Flash page size for nRF52840 (4 KB).
#[cfg(feature = "embedded")]
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
#[cfg(feature = "embedded")]
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
#[cfg(feature = "embedded")]
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key for the preset area blob in the map storage.
#[cfg(feature = "embedded")]
const KEY_PRESET_AREA: u8 = 0x01;

/// Working buffer for sequential-storage (blob + item overhead).
#[cfg(feature = "embedded")]
const MAX_RECORD_SIZE: usize = STORE_SIZE + 64;

/// RAM shadow of the preset area, synced with flash.
pub struct PresetStore {
    /// Shadow of all 16 presets.
    bytes: [u8; STORE_SIZE],
    /// Dirty flag - true if the shadow differs from flash.
    dirty: bool,
}

impl Default for PresetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetStore {
    /// Create an erased store (all bytes zero, i.e. every record
    /// disabled, every preset silent).
    pub const fn new() -> Self {
        Self {
            bytes: [0; STORE_SIZE],
            dirty: false,
        }
    }

    /// True if the shadow has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Async load from flash using sequential-storage.
    #[cfg(feature = "embedded")]
    pub async fn load_from_flash(
        &mut self,
        flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
    ) {
        let flash_range = STORAGE_START..STORAGE_END;
        let mut buf = [0u8; MAX_RECORD_SIZE];

        match sequential_storage::map::fetch_item::<u8, &[u8], _>(
            flash,
            flash_range,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_PRESET_AREA,
        )
        .await
        {
            Ok(Some(data)) if data.len() == STORE_SIZE => {
                self.bytes.copy_from_slice(data);
                info!("Loaded preset area from flash");
            }
            Ok(Some(data)) => {
                error!("Preset blob has wrong length {} - keeping erased state", data.len());
                self.bytes = [0; STORE_SIZE];
            }
            Ok(None) => {
                info!("No presets in flash - starting erased");
                self.bytes = [0; STORE_SIZE];
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                self.bytes = [0; STORE_SIZE];
            }
        }
        self.dirty = false;
    }

    /// Persist the shadow to flash if it changed.
    #[cfg(feature = "embedded")]
    pub async fn save_to_flash(
        &mut self,
        flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
    ) {
        if !self.dirty {
            debug!("PresetStore: no changes to save");
            return;
        }

        let flash_range = STORAGE_START..STORAGE_END;
        let mut buf = [0u8; MAX_RECORD_SIZE];
        let item: &[u8] = &self.bytes;

        match sequential_storage::map::store_item::<u8, &[u8], _>(
            flash,
            flash_range,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_PRESET_AREA,
            &item,
        )
        .await
        {
            Ok(_) => {
                info!("Saved preset area to flash");
                self.dirty = false;
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
            }
        }
    }
}

impl NvStore for PresetStore {
    fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[addr as usize % STORE_SIZE]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        let slot = &mut self.bytes[addr as usize % STORE_SIZE];
        if *slot != value {
            *slot = value;
            self.dirty = true;
        }
    }
}
