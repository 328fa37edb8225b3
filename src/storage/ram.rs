//! RAM storage backend
//!
//! Plain byte buffer with no flash write restrictions. Used as the shadow
//! region during migration and as a scratch backend in tests.

use crate::platform::{error::FlashError, traits::StorageBackend, Result};
use alloc::vec;
use alloc::vec::Vec;

/// Erased-state byte
const ERASED: u8 = 0xFF;

/// In-memory backend covering addresses `[0, len)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamBackend {
    bytes: Vec<u8>,
}

impl RamBackend {
    /// Create an erased backend of `len` bytes
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![ERASED; len],
        }
    }

    /// Wrap an existing image
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Backend contents
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the backend, returning its contents
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn range(&self, offset: u32, len: usize) -> Result<core::ops::Range<usize>> {
        let start = offset as usize;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(FlashError::InvalidAddress)?;
        Ok(start..end)
    }
}

impl StorageBackend for RamBackend {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        let range = self.range(offset, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn erase(&mut self, offset: u32, size: u32) -> Result<()> {
        let range = self.range(offset, size as usize)?;
        self.bytes[range].fill(ERASED);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;

    #[test]
    fn test_new_is_erased() {
        let ram = RamBackend::new(16);
        assert_eq!(ram.len(), 16);
        assert!(ram.as_slice().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_write_overwrites() {
        let mut ram = RamBackend::new(8);
        ram.write(2, &[0x00, 0x00]).unwrap();
        ram.write(2, &[0xAB, 0xCD]).unwrap();

        let mut buf = [0u8; 4];
        ram.read(1, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xAB, 0xCD, 0xFF]);
    }

    #[test]
    fn test_erase_range() {
        let mut ram = RamBackend::from_vec(vec![0u8; 8]);
        ram.erase(2, 3).unwrap();
        assert_eq!(ram.as_slice(), &[0, 0, 0xFF, 0xFF, 0xFF, 0, 0, 0]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut ram = RamBackend::new(8);
        let mut buf = [0u8; 4];

        assert_eq!(
            ram.read(6, &mut buf),
            Err(PlatformError::Flash(FlashError::InvalidAddress))
        );
        assert!(ram.write(u32::MAX, &[1]).is_err());
        assert!(ram.erase(0, 9).is_err());
    }
}
