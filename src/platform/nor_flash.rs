//! `embedded-storage` NOR flash adapters
//!
//! [`NorFlashBackend`] lets any [`NorFlash`] driver back a storage region.
//! Every write must start and end on a program unit, since a plain NOR
//! device may not program the same unit twice between erases.
//!
//! [`MultiwriteBackend`] is for devices that implement
//! [`MultiwriteNorFlash`]. Unaligned writes are widened to whole units and
//! padded with 0xFF, which leaves the neighbouring bytes unchanged.

use crate::platform::{error::FlashError, traits::StorageBackend, PlatformError, Result};
use embedded_storage::nor_flash::{MultiwriteNorFlash, NorFlash, NorFlashError, NorFlashErrorKind};
use tlvstore_core::tlv::PADDING_BYTE;

/// Staging buffer used for unaligned writes
const STAGING_LEN: usize = 64;

/// [`StorageBackend`] over an `embedded-storage` NOR flash device
pub struct NorFlashBackend<F> {
    flash: F,
}

impl<F: NorFlash> NorFlashBackend<F> {
    /// Wrap a flash driver
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Release the flash driver
    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Borrow the flash driver
    pub fn inner(&mut self) -> &mut F {
        &mut self.flash
    }
}

impl<F: NorFlash> StorageBackend for NorFlashBackend<F> {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        read_flash(&mut self.flash, offset, buf)
    }

    /// # Errors
    ///
    /// Returns `FlashError::Unaligned` without touching the device when the
    /// write does not start and end on a `WRITE_SIZE` boundary.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        if !is_aligned::<F>(offset, data.len()) {
            crate::log_warn!(
                "flash: unaligned write of {} bytes at {:#x}",
                data.len(),
                offset
            );
            return Err(FlashError::Unaligned.into());
        }
        write_flash(&mut self.flash, offset, data)
    }

    fn erase(&mut self, offset: u32, size: u32) -> Result<()> {
        erase_flash(&mut self.flash, offset, size)
    }
}

/// [`StorageBackend`] over a NOR device whose program units may be
/// programmed more than once between erases
pub struct MultiwriteBackend<F> {
    flash: F,
}

impl<F: MultiwriteNorFlash> MultiwriteBackend<F> {
    /// Wrap a flash driver
    pub fn new(flash: F) -> Self {
        Self { flash }
    }

    /// Release the flash driver
    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Borrow the flash driver
    pub fn inner(&mut self) -> &mut F {
        &mut self.flash
    }
}

impl<F: MultiwriteNorFlash> StorageBackend for MultiwriteBackend<F> {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        read_flash(&mut self.flash, offset, buf)
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        if is_aligned::<F>(offset, data.len()) {
            return write_flash(&mut self.flash, offset, data);
        }
        write_padded(&mut self.flash, offset, data)
    }

    fn erase(&mut self, offset: u32, size: u32) -> Result<()> {
        erase_flash(&mut self.flash, offset, size)
    }
}

fn is_aligned<F: NorFlash>(offset: u32, len: usize) -> bool {
    let align = F::WRITE_SIZE;
    align <= 1 || (offset as usize % align == 0 && len % align == 0)
}

fn read_flash<F: NorFlash>(flash: &mut F, offset: u32, buf: &mut [u8]) -> Result<()> {
    flash
        .read(offset, buf)
        .map_err(|e| map_error(e.kind(), FlashError::ReadFailed))
}

fn write_flash<F: NorFlash>(flash: &mut F, offset: u32, data: &[u8]) -> Result<()> {
    flash
        .write(offset, data)
        .map_err(|e| map_error(e.kind(), FlashError::WriteFailed))
}

fn erase_flash<F: NorFlash>(flash: &mut F, offset: u32, size: u32) -> Result<()> {
    let to = offset.checked_add(size).ok_or(FlashError::InvalidAddress)?;
    flash
        .erase(offset, to)
        .map_err(|e| map_error(e.kind(), FlashError::EraseFailed))
}

fn write_padded<F: NorFlash>(flash: &mut F, offset: u32, data: &[u8]) -> Result<()> {
    let align = F::WRITE_SIZE as u32;
    if align as usize > STAGING_LEN || STAGING_LEN as u32 % align != 0 {
        return Err(FlashError::Unaligned.into());
    }

    let end = offset
        .checked_add(data.len() as u32)
        .ok_or(FlashError::InvalidAddress)?;
    let first = offset - offset % align;
    let last = end.div_ceil(align) * align;

    let mut staging = [PADDING_BYTE; STAGING_LEN];
    let mut pos = first;
    while pos < last {
        let len = (last - pos).min(STAGING_LEN as u32);
        staging.fill(PADDING_BYTE);

        let copy_start = pos.max(offset);
        let copy_end = (pos + len).min(end);
        if copy_start < copy_end {
            let dst = (copy_start - pos) as usize..(copy_end - pos) as usize;
            let src = (copy_start - offset) as usize..(copy_end - offset) as usize;
            staging[dst].copy_from_slice(&data[src]);
        }

        write_flash(flash, pos, &staging[..len as usize])?;
        pos += len;
    }

    Ok(())
}

fn map_error(kind: NorFlashErrorKind, other: FlashError) -> PlatformError {
    match kind {
        NorFlashErrorKind::NotAligned => FlashError::Unaligned.into(),
        NorFlashErrorKind::OutOfBounds => FlashError::InvalidAddress.into(),
        _ => other.into(),
    }
}
