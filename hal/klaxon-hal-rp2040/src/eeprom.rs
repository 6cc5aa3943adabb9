//! Emulated EEPROM on RP2040 flash
//!
//! The RP2040 has no EEPROM. A small RAM image stands in for one: reads
//! and write-if-changed updates hit the image, and the whole image is
//! persisted as a single item of a sequential-storage map in the last
//! 64KB of flash, which gives wear leveling for free.
//!
//! [`ByteStore::commit`] only marks the image for persistence; flash
//! writes are async and happen when the loop calls [`FlashEeprom::flush`].
//! A failed write is not retried until the next commit.

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use klaxon_hal::store::ERASED;
use klaxon_hal::{ByteStore, StorageKey, StoreError};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const STORE_PARTITION_SIZE: usize = 64 * 1024;
pub const STORE_PARTITION_START: usize = FLASH_SIZE - STORE_PARTITION_SIZE;

/// Flash range for the store partition
pub const STORE_RANGE: core::ops::Range<u32> =
    (STORE_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Emulated EEPROM size in bytes
pub const EEPROM_SIZE: usize = 64;

/// Scratch buffer for one map item (key, length header, image)
const ITEM_BUFFER_SIZE: usize = 128;

/// Persistence bookkeeping for the RAM image
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FlushState {
    /// Image differs from flash
    dirty: bool,
    /// Commit requested since the last flush attempt
    pending: bool,
}

impl FlushState {
    fn needs_flush(&self) -> bool {
        self.pending && self.dirty
    }

    /// Record the outcome of a flush attempt
    ///
    /// The request is dropped either way; a failed image stays dirty so
    /// the next commit writes it again.
    fn finish(&mut self, written: bool) {
        self.pending = false;
        if written {
            self.dirty = false;
        }
    }
}

/// RAM-imaged byte store persisted to flash
pub struct FlashEeprom<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    image: [u8; EEPROM_SIZE],
    state: FlushState,
}

impl<'d> FlashEeprom<'d> {
    /// Open the store and load the last persisted image
    ///
    /// A missing or unreadable item leaves the image erased.
    pub async fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        let mut store = Self {
            flash: Flash::new(flash, dma),
            image: [ERASED; EEPROM_SIZE],
            state: FlushState::default(),
        };
        store.load().await;
        store
    }

    async fn load(&mut self) {
        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            STORE_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &StorageKey::EepromImage,
        )
        .await;

        match result {
            Ok(Some(data)) => {
                let len = data.len().min(EEPROM_SIZE);
                self.image[..len].copy_from_slice(&data[..len]);
            }
            Ok(None) => {
                #[cfg(feature = "defmt")]
                defmt::info!("eeprom: no stored image");
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("eeprom: stored image unreadable");
            }
        }
    }

    /// Whether a commit is waiting to be written to flash
    pub fn needs_flush(&self) -> bool {
        self.state.needs_flush()
    }

    /// Write the image to flash if a commit is pending
    pub async fn flush(&mut self) -> Result<(), StoreError> {
        if !self.state.needs_flush() {
            self.state.pending = false;
            return Ok(());
        }

        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];
        let data: &[u8] = &self.image;

        let result = map::store_item(
            &mut self.flash,
            STORE_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &StorageKey::EepromImage,
            &data,
        )
        .await;

        self.state.finish(result.is_ok());
        result.map_err(|_| StoreError::Storage)
    }
}

impl ByteStore for FlashEeprom<'_> {
    fn read(&mut self, addr: usize) -> Result<u8, StoreError> {
        self.image.get(addr).copied().ok_or(StoreError::OutOfRange)
    }

    fn update(&mut self, addr: usize, value: u8) -> Result<(), StoreError> {
        let cell = self.image.get_mut(addr).ok_or(StoreError::OutOfRange)?;
        if *cell != value {
            *cell = value;
            self.state.dirty = true;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.state.pending = true;
        Ok(())
    }

    fn capacity(&self) -> usize {
        EEPROM_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed() -> FlushState {
        FlushState {
            dirty: true,
            pending: true,
        }
    }

    #[test]
    fn test_flush_needs_change_and_commit() {
        assert!(!FlushState::default().needs_flush());
        assert!(committed().needs_flush());
        // Commit with nothing changed writes nothing
        let unchanged = FlushState {
            dirty: false,
            pending: true,
        };
        assert!(!unchanged.needs_flush());
    }

    #[test]
    fn test_successful_flush_is_clean() {
        let mut state = committed();
        state.finish(true);
        assert_eq!(state, FlushState::default());
    }

    #[test]
    fn test_failed_flush_waits_for_next_commit() {
        let mut state = committed();
        state.finish(false);
        assert!(!state.needs_flush());
        assert!(state.dirty);

        state.pending = true;
        assert!(state.needs_flush());
    }
}
