//! Mock Flash implementation for testing
//!
//! Provides in-memory Flash simulation for unit tests.

use crate::platform::{error::FlashError, traits::StorageBackend, Result};
use alloc::vec;
use alloc::vec::Vec;

/// Default erase block size (4 KB)
const BLOCK_SIZE: u32 = 4096;

/// Default flash capacity (64 KB)
const FLASH_CAPACITY: u32 = 16 * BLOCK_SIZE;

/// Mock Flash implementation
///
/// Simulates NOR flash in memory for testing. Supports:
/// - Read/write/erase operations with 1→0 write semantics
/// - Erase count tracking per block
/// - Power-loss simulation for reliability testing
/// - Read, write and erase failure injection
///
/// # Example
///
/// ```
/// # #[cfg(feature = "mock")] {
/// use tlvstore::platform::mock::MockFlash;
/// use tlvstore::platform::traits::StorageBackend;
///
/// let mut flash = MockFlash::new();
///
/// // Write data
/// let data = [0x53, 0x49, 0x44, 0x30]; // "SID0" magic
/// flash.write(0x1000, &data).unwrap();
///
/// // Read back
/// let mut buf = [0u8; 4];
/// flash.read(0x1000, &mut buf).unwrap();
/// assert_eq!(buf, data);
///
/// // Erase and check erase count
/// flash.erase(0x1000, 4096).unwrap();
/// assert_eq!(flash.erase_count(0x1000), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct MockFlash {
    /// Flash storage (initialized to 0xFF - erased state)
    storage: Vec<u8>,
    /// Erase block size
    block_size: u32,
    /// Erase count per block
    erase_counts: Vec<u32>,
    /// Successful operations so far
    reads: usize,
    writes: usize,
    /// Operation index at which the matching call fails
    fail_read_at: Option<usize>,
    fail_write_at: Option<usize>,
    fail_erase: bool,
    /// Simulated power loss flag
    power_loss: bool,
}

impl MockFlash {
    /// Create a 64 KB mock Flash with 4 KB blocks
    pub fn new() -> Self {
        Self::with_geometry(FLASH_CAPACITY, BLOCK_SIZE)
    }

    /// Create a mock Flash of `capacity` bytes erased in `block_size` units
    pub fn with_geometry(capacity: u32, block_size: u32) -> Self {
        let block_count = capacity.div_ceil(block_size) as usize;

        Self {
            storage: vec![0xFF; capacity as usize],
            block_size,
            erase_counts: vec![0; block_count],
            reads: 0,
            writes: 0,
            fail_read_at: None,
            fail_write_at: None,
            fail_erase: false,
            power_loss: false,
        }
    }

    /// Create a mock Flash preloaded with `image` at address 0
    pub fn from_image(image: &[u8]) -> Self {
        let capacity = (image.len() as u32).div_ceil(BLOCK_SIZE).max(1) * BLOCK_SIZE;
        let mut flash = Self::with_geometry(capacity, BLOCK_SIZE);
        flash.load(0, image);
        flash
    }

    /// Overwrite contents directly, ignoring flash write rules
    pub fn load(&mut self, address: u32, data: &[u8]) {
        let start = address as usize;
        self.storage[start..start + data.len()].copy_from_slice(data);
    }

    /// Get Flash contents (for test verification)
    pub fn contents(&self, address: u32, len: usize) -> &[u8] {
        &self.storage[address as usize..address as usize + len]
    }

    /// Flash capacity in bytes
    pub fn capacity(&self) -> u32 {
        self.storage.len() as u32
    }

    /// Get erase count for the block containing `address`
    pub fn erase_count(&self, address: u32) -> u32 {
        self.erase_counts[(address / self.block_size) as usize]
    }

    /// Get total erase count across all blocks
    pub fn total_erase_count(&self) -> u32 {
        self.erase_counts.iter().sum()
    }

    /// Number of successful reads
    pub fn read_count(&self) -> usize {
        self.reads
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Let `n` more reads succeed, then fail the next one
    pub fn fail_after_reads(&mut self, n: usize) {
        self.fail_read_at = Some(self.reads + n);
    }

    /// Let `n` more writes succeed, then fail the next one
    pub fn fail_after_writes(&mut self, n: usize) {
        self.fail_write_at = Some(self.writes + n);
    }

    /// Fail the next erase
    pub fn fail_next_erase(&mut self) {
        self.fail_erase = true;
    }

    /// Simulate power loss during next write operation
    ///
    /// The next write will only partially complete.
    pub fn simulate_power_loss(&mut self) {
        self.power_loss = true;
    }

    fn check_range(&self, address: u32, len: usize) -> Result<()> {
        match (address as usize).checked_add(len) {
            Some(end) if end <= self.storage.len() => Ok(()),
            _ => Err(FlashError::InvalidAddress.into()),
        }
    }
}

impl Default for MockFlash {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MockFlash {
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(address, buf.len())?;

        if self.fail_read_at == Some(self.reads) {
            self.fail_read_at = None;
            return Err(FlashError::ReadFailed.into());
        }

        let start = address as usize;
        buf.copy_from_slice(&self.storage[start..start + buf.len()]);
        self.reads += 1;

        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.check_range(address, data.len())?;

        if self.fail_write_at == Some(self.writes) {
            self.fail_write_at = None;
            return Err(FlashError::WriteFailed.into());
        }

        // Only write half the data to simulate power loss
        let write_len = if self.power_loss {
            self.power_loss = false;
            data.len() / 2
        } else {
            data.len()
        };

        // Flash can only change bits from 1→0
        let start = address as usize;
        for (cell, byte) in self.storage[start..start + write_len].iter_mut().zip(data) {
            *cell &= *byte;
        }
        self.writes += 1;

        Ok(())
    }

    fn erase(&mut self, address: u32, size: u32) -> Result<()> {
        if !address.is_multiple_of(self.block_size) || !size.is_multiple_of(self.block_size) {
            return Err(FlashError::Unaligned.into());
        }
        self.check_range(address, size as usize)?;

        if self.fail_erase {
            self.fail_erase = false;
            return Err(FlashError::EraseFailed.into());
        }

        let start = address as usize;
        self.storage[start..start + size as usize].fill(0xFF);

        let first_block = (address / self.block_size) as usize;
        let block_count = (size / self.block_size) as usize;
        for count in &mut self.erase_counts[first_block..first_block + block_count] {
            *count += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;

    #[test]
    fn test_mock_flash_read_write() {
        let mut flash = MockFlash::new();

        let data = [0x53, 0x49, 0x44, 0x30];
        flash.write(0x1000, &data).unwrap();

        let mut buf = [0u8; 4];
        flash.read(0x1000, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_mock_flash_erase() {
        let mut flash = MockFlash::new();

        flash.write(0x1000, &[0x55; 256]).unwrap();
        flash.erase(0x1000, 4096).unwrap();

        assert!(flash.contents(0x1000, 256).iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_mock_flash_erase_count() {
        let mut flash = MockFlash::new();

        flash.erase(0x1000, 4096).unwrap();
        flash.erase(0x1000, 8192).unwrap();

        assert_eq!(flash.erase_count(0x1000), 2);
        assert_eq!(flash.erase_count(0x2000), 1);
        assert_eq!(flash.total_erase_count(), 3);
    }

    #[test]
    fn test_mock_flash_invalid_address() {
        let mut flash = MockFlash::new();

        let result = flash.write(FLASH_CAPACITY - 2, &[0x00; 4]);
        assert_eq!(result, Err(PlatformError::Flash(FlashError::InvalidAddress)));

        let mut buf = [0u8; 4];
        let result = flash.read(FLASH_CAPACITY, &mut buf);
        assert!(result.is_err());
    }

    #[test]
    fn test_mock_flash_unaligned_erase() {
        let mut flash = MockFlash::new();

        assert!(flash.erase(0x1100, 4096).is_err());
        assert!(flash.erase(0x1000, 1024).is_err());
    }

    #[test]
    fn test_mock_flash_power_loss() {
        let mut flash = MockFlash::new();

        flash.simulate_power_loss();
        flash.write(0x1000, &[0x55; 256]).unwrap();

        // Only half should be written
        assert_eq!(flash.contents(0x1000, 128), &[0x55; 128]);
        assert_eq!(flash.contents(0x1080, 128), &[0xFF; 128]);
    }

    #[test]
    fn test_mock_flash_write_only_clears_bits() {
        let mut flash = MockFlash::new();

        flash.write(0x1000, &[0x0F]).unwrap();
        flash.write(0x1000, &[0xFF]).unwrap();

        let mut buf = [0u8; 1];
        flash.read(0x1000, &mut buf).unwrap();
        assert_eq!(buf[0], 0x0F);
    }

    #[test]
    fn test_mock_flash_failure_injection() {
        let mut flash = MockFlash::new();
        let mut buf = [0u8; 4];

        flash.fail_after_reads(1);
        assert!(flash.read(0, &mut buf).is_ok());
        assert_eq!(
            flash.read(0, &mut buf),
            Err(PlatformError::Flash(FlashError::ReadFailed))
        );
        assert!(flash.read(0, &mut buf).is_ok());

        flash.fail_after_writes(0);
        assert_eq!(
            flash.write(0, &[0]),
            Err(PlatformError::Flash(FlashError::WriteFailed))
        );
        assert_eq!(flash.contents(0, 1), &[0xFF]);

        flash.fail_next_erase();
        assert!(flash.erase(0, 4096).is_err());
        assert!(flash.erase(0, 4096).is_ok());
    }

    #[test]
    fn test_mock_flash_from_image() {
        let flash = MockFlash::from_image(&[1, 2, 3]);
        assert_eq!(flash.capacity(), 4096);
        assert_eq!(flash.contents(0, 4), &[1, 2, 3, 0xFF]);
    }
}
