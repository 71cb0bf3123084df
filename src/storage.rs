//! Persistence of the last accepted pattern in a non-volatile region.
//!
//! Layout, little-endian, starting at the region base:
//!
//! | offset | size  | content             |
//! |--------|-------|---------------------|
//! | 0      | 2     | magic               |
//! | 2      | 2     | payload length      |
//! | 4      | len   | raw pattern JSON    |
//!
//! The image is valid only if the magic matches and
//! `0 < len <= CAPACITY - 4`. Saves clear the magic first and write it
//! last, so a save cut short by power loss reads back as "no pattern".

use crate::config::{STORAGE_CAPACITY, STORAGE_HEADER_SIZE, STORAGE_MAGIC};
use crate::pattern::Pattern;
use embedded_storage::Storage;
use heapless::Vec;

/// Bytes in front of the payload: magic + length.
pub const HEADER_SIZE: usize = STORAGE_HEADER_SIZE;

const ERASED_MAGIC: [u8; 2] = [0, 0];

/// Errors from loading or saving the persisted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// The storage driver reported a failure.
    Driver,
    /// Payload does not fit in the region; nothing was written.
    TooLarge { len: usize, max: usize },
    /// No image: magic sentinel missing.
    InvalidMagic,
    /// Length is zero or larger than the region (or the caller's buffer)
    /// allows.
    InvalidLength(u16),
    /// Stored payload is not a valid pattern.
    InvalidData,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StorageError::Driver => write!(f, "storage driver error"),
            StorageError::TooLarge { len, max } => {
                write!(f, "pattern of {} bytes exceeds storage limit of {} bytes", len, max)
            }
            StorageError::InvalidMagic => write!(f, "no stored pattern (magic mismatch)"),
            StorageError::InvalidLength(len) => write!(f, "invalid stored length {}", len),
            StorageError::InvalidData => write!(f, "stored pattern is corrupt"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}

/// Reads and writes the pattern image at a fixed offset of `S`.
///
/// # Type Parameters
/// * `S` - Storage driver (EEPROM, emulated EEPROM, RAM for tests)
/// * `CAPACITY` - Size of the region reserved for the image
pub struct PatternStorage<S, const CAPACITY: usize = STORAGE_CAPACITY> {
    storage: S,
    base: u32,
}

impl<S: Storage, const CAPACITY: usize> PatternStorage<S, CAPACITY> {
    /// Largest payload that fits the region.
    pub const MAX_PAYLOAD: usize = CAPACITY - HEADER_SIZE;

    /// Uses the region `[base, base + CAPACITY)` of `storage`.
    pub fn new(storage: S, base: u32) -> Self {
        Self { storage, base }
    }

    pub fn inner(&self) -> &S {
        &self.storage
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Writes `json` as the new image.
    ///
    /// Empty payloads are refused with [`StorageError::InvalidLength`],
    /// oversized ones with [`StorageError::TooLarge`]. Either way the
    /// previous image is left untouched.
    pub fn save(&mut self, json: &[u8]) -> Result<(), StorageError> {
        if json.is_empty() {
            return Err(StorageError::InvalidLength(0));
        }
        if json.len() > Self::MAX_PAYLOAD {
            return Err(StorageError::TooLarge {
                len: json.len(),
                max: Self::MAX_PAYLOAD,
            });
        }

        // MAX_PAYLOAD is below u16::MAX for any region this layout supports.
        let len = json.len() as u16;

        self.write(0, &ERASED_MAGIC)?;
        self.write(2, &len.to_le_bytes())?;
        self.write(HEADER_SIZE as u32, json)?;
        self.write(0, &STORAGE_MAGIC.to_le_bytes())
    }

    /// Reads the raw payload into `buf`.
    ///
    /// `buf` is cleared first and stays empty on error.
    pub fn load_raw<const N: usize>(&mut self, buf: &mut Vec<u8, N>) -> Result<(), StorageError> {
        buf.clear();

        let mut header = [0u8; HEADER_SIZE];
        self.read(0, &mut header)?;

        let magic = u16::from_le_bytes([header[0], header[1]]);
        if magic != STORAGE_MAGIC {
            return Err(StorageError::InvalidMagic);
        }

        let len = u16::from_le_bytes([header[2], header[3]]);
        let size = usize::from(len);
        if size == 0 || size > Self::MAX_PAYLOAD || size > N {
            return Err(StorageError::InvalidLength(len));
        }

        buf.resize_default(size).map_err(|_| StorageError::InvalidLength(len))?;
        if let Err(e) = self.read(HEADER_SIZE as u32, buf) {
            buf.clear();
            return Err(e);
        }
        Ok(())
    }

    /// Loads and parses the stored pattern. `buf` receives the raw JSON.
    pub fn load<const N: usize>(&mut self, buf: &mut Vec<u8, N>) -> Result<Pattern, StorageError> {
        self.load_raw(buf)?;
        Pattern::from_json(buf).map_err(|_| {
            buf.clear();
            StorageError::InvalidData
        })
    }

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), StorageError> {
        self.storage
            .read(self.base + offset, bytes)
            .map_err(|_| StorageError::Driver)
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), StorageError> {
        self.storage
            .write(self.base + offset, bytes)
            .map_err(|_| StorageError::Driver)
    }
}
