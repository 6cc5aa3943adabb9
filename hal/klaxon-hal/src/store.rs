//! Persistent byte storage abstractions
//!
//! The firmware keeps its settings in a small byte-addressable store with
//! EEPROM semantics: single-byte reads and write-if-changed updates.
//! Boards without a real EEPROM emulate one on top of flash; the
//! [`StorageKey`] identifies the emulated image inside a key-value flash map.

/// Value of an erased EEPROM/flash cell
pub const ERASED: u8 = 0xFF;

/// Storage keys for data kept in the flash key-value map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Emulated EEPROM image (raw bytes)
    EepromImage = 0,
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::EepromImage),
            _ => None,
        }
    }
}

/// Errors from byte store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Address outside the store
    OutOfRange,
    /// Underlying storage operation failed
    Storage,
}

/// Byte-addressable persistent store
///
/// Mirrors the EEPROM access pattern: `read` a byte, `update` a byte only
/// if it differs. `commit` asks the implementation to make pending updates
/// durable; stores that write through (real EEPROM) keep the default no-op.
pub trait ByteStore {
    /// Read the byte at `addr`
    fn read(&mut self, addr: usize) -> Result<u8, StoreError>;

    /// Write `value` at `addr` if it differs from the stored byte
    fn update(&mut self, addr: usize, value: u8) -> Result<(), StoreError>;

    /// Make previous updates durable
    fn commit(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Total addressable bytes
    fn capacity(&self) -> usize;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}
