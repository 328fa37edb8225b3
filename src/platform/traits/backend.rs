//! Storage backend trait
//!
//! This module defines the byte-addressable backend a storage region lives on.
//! Flash, a RAM buffer and test mocks all implement it.

use crate::platform::Result;

/// Byte-addressable storage backend
///
/// Offsets are absolute backend addresses; regions are carved out of the
/// backend by the stores built on top of it.
///
/// # Flash Characteristics
///
/// - Erase operations set all bytes to 0xFF
/// - On flash, write operations can only change bits from 1→0
/// - Operations are blocking and run to completion or fail
///
/// # Safety Invariants
///
/// - Only one owner per backend instance (no concurrent access)
/// - Implementations validate addresses; callers do not retry
pub trait StorageBackend {
    /// Read data from the backend
    ///
    /// Reads `buf.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the range is out of bounds.
    /// Returns `PlatformError::Flash(FlashError::ReadFailed)` if the read operation fails.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;

    /// Write data to the backend
    ///
    /// Writes `data` starting at `offset`. On flash the target must be erased.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::InvalidAddress)` if the range is out of bounds.
    /// Returns `PlatformError::Flash(FlashError::WriteFailed)` if the write operation fails.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Erase `size` bytes starting at `offset` back to 0xFF
    ///
    /// Flash backends may require `offset` and `size` to be erase-block aligned.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Flash(FlashError::Unaligned)` for a misaligned range.
    /// Returns `PlatformError::Flash(FlashError::EraseFailed)` if the erase operation fails.
    fn erase(&mut self, offset: u32, size: u32) -> Result<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for &mut T {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read(offset, buf)
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        (**self).write(offset, data)
    }

    fn erase(&mut self, offset: u32, size: u32) -> Result<()> {
        (**self).erase(offset, size)
    }
}
