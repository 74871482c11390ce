//! Persistent settings storage
//!
//! The host reserves a small non-volatile area for the tool changer. The
//! core stores whole records under a one-byte key and never updates a
//! record in place.

use core::future::Future;

/// Record slot in the tool changer's storage area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Settings record (postcard encoded, CRC protected)
    AtcSettings = 0x01,
}

impl StorageKey {
    /// Every key, in storage order
    pub const ALL: [StorageKey; 1] = [StorageKey::AtcSettings];

    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for StorageKey {
    type Error = FlashError;

    fn try_from(value: u8) -> Result<Self, FlashError> {
        StorageKey::ALL
            .into_iter()
            .find(|key| key.as_u8() == value)
            .ok_or(FlashError::Corrupted)
    }
}

/// Storage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Underlying flash or NVS driver reported an error
    Io,
    /// Nothing stored under the key
    NotFound,
    /// Stored record is larger than the read buffer
    BufferTooSmall,
    /// Stored bytes could not be interpreted
    Corrupted,
    /// No room left for the record
    Full,
}

/// Key/value record storage provided by the host
///
/// Writes replace the previous record for the key as a whole; a reader
/// must never observe a partially written record.
pub trait FlashStorage {
    /// Copy the record stored under `key` into `buffer`, returning its length
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> impl Future<Output = Result<usize, FlashError>>;

    /// Store `data` under `key`
    fn write(&mut self, key: StorageKey, data: &[u8]) -> impl Future<Output = Result<(), FlashError>>;

    /// Drop every record (settings restore)
    fn erase_all(&mut self) -> impl Future<Output = Result<(), FlashError>>;
}

/// Keys serialize as their single tag byte
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, sequential_storage::map::SerializationError> {
        let slot = buffer
            .first_mut()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        *slot = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        let tag = buffer
            .first()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        StorageKey::try_from(*tag)
            .map(|key| (key, 1))
            .map_err(|_| sequential_storage::map::SerializationError::InvalidFormat)
    }
}
