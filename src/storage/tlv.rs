//! TLV record codec over a storage backend
//!
//! Records are appended after an optional start marker and located by a
//! forward scan. Nothing is ever rewritten in place: writing a type twice
//! leaves two records, and lookups return the first.
//!
//! # Region Layout
//!
//! ```text
//! start                                                              end
//! ┌──────────────┬────────┬──────────────┬────────┬──────────┬───────┐
//! │ start marker │ header │ payload+pad  │ header │ payload  │ 0xFF… │
//! │ marker_size  │ 4      │ len + pad    │ 4      │ …        │ free  │
//! └──────────────┴────────┴──────────────┴────────┴──────────┴───────┘
//! ```
//!
//! # Example
//!
//! ```
//! use tlvstore::storage::{RamBackend, Tlv, TlvRegion};
//!
//! let region = TlvRegion::new(0, 64, 0).unwrap();
//! let mut tlv = Tlv::new(RamBackend::new(64), region);
//!
//! tlv.write(1, &[0xAA, 0xBB, 0xCC]).unwrap();
//!
//! let mut buf = [0u8; 3];
//! tlv.read(1, &mut buf).unwrap();
//! assert_eq!(buf, [0xAA, 0xBB, 0xCC]);
//! assert_eq!(tlv.next_free_offset().unwrap(), 8);
//! ```

use crate::platform::traits::StorageBackend;
use crate::storage::error::{StorageError, StorageResult};
use tlvstore_core::tlv::{TlvHeader, DATA_ALIGN, MAX_PAYLOAD_LEN, PADDING_BYTE, TYPE_EMPTY};

const HEADER_SIZE: u32 = TlvHeader::SIZE as u32;

/// Largest record including header and padding
const RECORD_MAX: usize = TlvHeader::SIZE + MAX_PAYLOAD_LEN + DATA_ALIGN - 1;

/// Address range a codec operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TlvRegion {
    /// First byte of the region (start marker goes here)
    pub start: u32,
    /// One past the last byte of the region
    pub end: u32,
    /// Bytes reserved for the start marker, possibly zero
    pub marker_size: u32,
}

impl TlvRegion {
    /// Create a region, checking that the marker fits inside it
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidArgument` if `start > end` or the marker
    /// is larger than the region.
    pub fn new(start: u32, end: u32, marker_size: u32) -> StorageResult<Self> {
        if start > end || marker_size > end - start {
            return Err(StorageError::InvalidArgument);
        }

        Ok(Self {
            start,
            end,
            marker_size,
        })
    }

    /// Region size in bytes
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Offset of the first record header
    pub fn data_start(&self) -> u32 {
        self.start + self.marker_size
    }
}

/// A located record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvRecord {
    /// Decoded header
    pub header: TlvHeader,
    /// Backend offset of the header
    pub offset: u32,
    /// Backend offset of the first payload byte
    pub data_offset: u32,
}

impl TlvRecord {
    /// Payload length in bytes, padding excluded
    pub fn len(&self) -> usize {
        self.header.data_size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.data_size == 0
    }
}

/// TLV codec bound to one backend and one region
///
/// The codec owns its backend; pass `&mut B` to borrow one instead.
#[derive(Debug)]
pub struct Tlv<B> {
    backend: B,
    region: TlvRegion,
}

impl<B: StorageBackend> Tlv<B> {
    /// Create a codec over `region` of `backend`
    pub fn new(backend: B, region: TlvRegion) -> Self {
        Self { backend, region }
    }

    /// Region this codec operates on
    pub fn region(&self) -> &TlvRegion {
        &self.region
    }

    /// Access the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Release the backend
    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Find the first record of type `ty`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no header of that type lies
    /// between the marker and the region end.
    pub fn lookup(&mut self, ty: u16) -> StorageResult<TlvRecord> {
        if ty == TYPE_EMPTY {
            return Err(StorageError::NotFound);
        }

        let end = self.region.end;
        let mut offset = self.region.data_start();

        while fits(offset, HEADER_SIZE, end) {
            let header = self.read_header(offset)?;
            let data_offset = offset + HEADER_SIZE;

            if header.ty == ty {
                crate::log_trace!("tlv: type {:#x} at {:#x}", ty, offset);
                return Ok(TlvRecord {
                    header,
                    offset,
                    data_offset,
                });
            }

            offset = data_offset.saturating_add(header.stored_len());
        }

        Err(StorageError::NotFound)
    }

    /// Read the first record of type `ty` into `buf`
    ///
    /// `buf` may be shorter than the stored payload, and may extend into the
    /// padding, but not past it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidArgument` for an empty buffer,
    /// `StorageError::NotFound` if the record is absent or its payload runs
    /// past the region end, and `StorageError::SizeMismatch` if `buf` is
    /// longer than payload plus padding.
    pub fn read(&mut self, ty: u16, buf: &mut [u8]) -> StorageResult<()> {
        if buf.is_empty() {
            return Err(StorageError::InvalidArgument);
        }

        let record = self.lookup(ty)?;
        if buf.len() > record.header.stored_len() as usize {
            crate::log_warn!(
                "tlv: read of {} bytes from type {:#x} holding {}",
                buf.len(),
                ty,
                record.header.data_size
            );
            return Err(StorageError::SizeMismatch);
        }

        if !fits(record.data_offset, buf.len() as u32, self.region.end) {
            return Err(StorageError::NotFound);
        }

        self.backend.read(record.data_offset, buf)?;
        Ok(())
    }

    /// Read the payload of type `ty` into the front of `buf`
    ///
    /// Returns the number of payload bytes copied, which is the payload
    /// length truncated to `buf.len()`.
    pub fn read_to(&mut self, ty: u16, buf: &mut [u8]) -> StorageResult<usize> {
        let record = self.lookup(ty)?;
        let len = record.len().min(buf.len());
        if len == 0 {
            return Err(StorageError::InvalidArgument);
        }

        self.read(ty, &mut buf[..len])?;
        Ok(len)
    }

    /// Append a record of type `ty`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidArgument` for empty data, data longer than
    /// 255 bytes or the reserved empty type, and `StorageError::NoSpace` if
    /// the record does not fit before the region end. Nothing is written on
    /// error.
    pub fn write(&mut self, ty: u16, data: &[u8]) -> StorageResult<()> {
        if ty == TYPE_EMPTY || data.is_empty() || data.len() > MAX_PAYLOAD_LEN {
            return Err(StorageError::InvalidArgument);
        }
        let header = TlvHeader::new(ty, data.len()).ok_or(StorageError::InvalidArgument)?;

        let offset = self.next_free_offset()?;
        if !fits(offset, header.record_len(), self.region.end) {
            crate::log_warn!(
                "tlv: no space for type {:#x} ({} bytes) at {:#x}",
                ty,
                data.len(),
                offset
            );
            return Err(StorageError::NoSpace);
        }

        // Header, payload and padding go out as a single backend write
        let mut record = [PADDING_BYTE; RECORD_MAX];
        record[..TlvHeader::SIZE].copy_from_slice(&header.to_bytes());
        record[TlvHeader::SIZE..TlvHeader::SIZE + data.len()].copy_from_slice(data);
        self.backend.write(offset, &record[..header.record_len() as usize])?;

        crate::log_trace!("tlv: wrote type {:#x} at {:#x}", ty, offset);
        Ok(())
    }

    /// Offset the next record would be written at
    ///
    /// The scan stops at the first erased or zero-length header. Returns the
    /// region end when no header fits.
    pub fn next_free_offset(&mut self) -> StorageResult<u32> {
        let end = self.region.end;
        let mut offset = self.region.data_start();

        while fits(offset, HEADER_SIZE, end) {
            let header = self.read_header(offset)?;
            if header.is_free() {
                return Ok(offset);
            }
            offset = offset
                .saturating_add(HEADER_SIZE)
                .saturating_add(header.stored_len());
        }

        Ok(end)
    }

    /// Read the start marker into `buf`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::SizeMismatch` unless `buf` is exactly the
    /// configured marker size.
    pub fn read_start_marker(&mut self, buf: &mut [u8]) -> StorageResult<()> {
        if buf.len() != self.region.marker_size as usize {
            return Err(StorageError::SizeMismatch);
        }
        if buf.is_empty() {
            return Ok(());
        }

        self.backend.read(self.region.start, buf)?;
        Ok(())
    }

    /// Write the start marker
    ///
    /// # Errors
    ///
    /// Returns `StorageError::SizeMismatch` unless `data` is exactly the
    /// configured marker size.
    pub fn write_start_marker(&mut self, data: &[u8]) -> StorageResult<()> {
        if data.len() != self.region.marker_size as usize {
            return Err(StorageError::SizeMismatch);
        }
        if data.is_empty() {
            return Ok(());
        }

        self.backend.write(self.region.start, data)?;
        Ok(())
    }

    fn read_header(&mut self, offset: u32) -> StorageResult<TlvHeader> {
        let mut raw = [0u8; TlvHeader::SIZE];
        self.backend.read(offset, &mut raw)?;
        TlvHeader::from_bytes(&raw).ok_or(StorageError::NotFound)
    }
}

/// True if `len` bytes starting at `offset` end at or before `end`
fn fits(offset: u32, len: u32, end: u32) -> bool {
    offset.checked_add(len).is_some_and(|stop| stop <= end)
}
