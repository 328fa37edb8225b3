//! Manufacturing value store
//!
//! Immutable, factory-provisioned device identity and key material, indexed by
//! integer identifiers with fixed sizes.
//!
//! # Layouts
//!
//! Both layouts begin with the `SID0` magic word followed by a big-endian
//! version word. The version selects how the rest of the region is read:
//!
//! - Version [`TLV_VERSION`]: TLV records after the 8-byte start marker
//! - Any other version: each value at a fixed word offset
//!
//! Identifiers at or above [`CORE_VALUE_MAX`] belong to the application. In
//! the fixed layout they are placed by an optional [`ValueResolver`].
//!
//! # Example
//!
//! ```
//! use tlvstore::storage::{MfgRegion, MfgStore, RamBackend};
//! use tlvstore_core::mfg::MfgValue;
//!
//! let region = MfgRegion::new(0, 4096).unwrap();
//! let mut store = MfgStore::new(RamBackend::new(4096), region);
//! assert!(store.is_empty());
//!
//! store.write(MfgValue::Version.id(), &8u32.to_be_bytes()).unwrap();
//! store.write(MfgValue::Apid.id(), &[0x76, 0x43, 0x74, 0x32]).unwrap();
//!
//! let mut apid = [0u8; 4];
//! store.read(MfgValue::Apid.id(), &mut apid);
//! assert_eq!(apid, [0x76, 0x43, 0x74, 0x32]);
//! ```

use crate::platform::traits::{DeviceIdSource, StorageBackend};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::tlv::{Tlv, TlvRegion};
use tlvstore_core::mfg::{
    MfgFlags, MfgHeader, MfgValue, CORE_VALUE_MAX, DEVID_SIZE, FLAGS_TYPE_ID, INVALID_OFFSET,
    INVALID_VERSION, MAX_FLASH_WRITE_LEN, SERIAL_NUM_SIZE, TLV_VERSION, VERSION_SIZE, WORD_SIZE,
};

/// Resolve an application identifier to a byte offset from the region start
///
/// Returns [`INVALID_OFFSET`] for identifiers the application does not know.
pub type ValueResolver = fn(u16) -> u32;

/// Leading byte of a device id synthesized from the MCU id
const DEVID_MCU_PREFIX: u8 = 0xBF;

/// Version-1 device ids span two words stored in network order
const DEVID_V1_LEN: usize = 8;

/// Upper three bits of the first device id byte encode a 5-byte id
const DEVID_SIZE_5_MASK: u8 = 0xA0;
const DEVID_MSB_MASK: u8 = 0x1F;

/// Version-1 markers as stored raw, and after conversion
const VERSION_1: u32 = 0x0000_0001;
const VERSION_1_RAW: u32 = 0x0100_0000;

/// Byte offset of the version word
const VERSION_OFFSET: u32 = MfgValue::Version.legacy_byte_offset();

/// Address range of the manufacturing store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MfgRegion {
    pub start: u32,
    pub end: u32,
}

impl MfgRegion {
    /// Create a region large enough for the start marker
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidArgument` if the range is inverted or
    /// shorter than the marker.
    pub fn new(start: u32, end: u32) -> StorageResult<Self> {
        if start > end || end - start < MfgHeader::SIZE as u32 {
            return Err(StorageError::InvalidArgument);
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Codec region for the TLV layout
    pub fn tlv_region(&self) -> TlvRegion {
        TlvRegion {
            start: self.start,
            end: self.end,
            marker_size: MfgHeader::SIZE as u32,
        }
    }
}

/// Storage layout in use, chosen by the stored version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MfgLayout {
    /// Values at fixed word offsets
    Fixed,
    /// TLV records after the start marker
    Tlv,
}

/// Manufacturing store over a backend region
pub struct MfgStore<B> {
    backend: B,
    region: MfgRegion,
    resolver: Option<ValueResolver>,
}

impl<B: StorageBackend> MfgStore<B> {
    /// Create a store with no application identifiers
    pub fn new(backend: B, region: MfgRegion) -> Self {
        Self {
            backend,
            region,
            resolver: None,
        }
    }

    /// Install a resolver for identifiers at or above `CORE_VALUE_MAX`
    pub fn with_resolver(mut self, resolver: ValueResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn region(&self) -> &MfgRegion {
        &self.region
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Stored version, or `INVALID_VERSION` if it cannot be read
    pub fn version(&mut self) -> u32 {
        let mut raw = [0u8; VERSION_SIZE];
        match self.backend.read(self.region.start + VERSION_OFFSET, &mut raw) {
            Ok(()) => u32::from_be_bytes(raw),
            Err(e) => {
                crate::log_error!("mfg: version read failed: {:?}", e);
                INVALID_VERSION
            }
        }
    }

    /// True when no version was ever written
    pub fn is_empty(&mut self) -> bool {
        self.version() == INVALID_VERSION
    }

    /// Layout selected by the stored version
    pub fn layout(&mut self) -> MfgLayout {
        if self.version() == TLV_VERSION {
            MfgLayout::Tlv
        } else {
            MfgLayout::Fixed
        }
    }

    /// Write value `id`
    ///
    /// Writing the version always targets the version word, whatever the
    /// current layout.
    ///
    /// # Errors
    ///
    /// - `StorageError::InvalidArgument`: empty data
    /// - `StorageError::OutOfResources`: more than 64 bytes, or the value
    ///   lies past the region end
    /// - `StorageError::SizeMismatch`: length differs from the value's fixed
    ///   size, or an application value is not word sized
    /// - `StorageError::NotFound`: the identifier has no location
    /// - `StorageError::AlreadyExists`: TLV layout already holds `id`
    /// - `StorageError::NoSpace`: TLV layout is full
    pub fn write(&mut self, id: u16, data: &[u8]) -> StorageResult<()> {
        if data.is_empty() {
            return Err(StorageError::InvalidArgument);
        }
        if data.len() > MAX_FLASH_WRITE_LEN {
            return Err(StorageError::OutOfResources);
        }

        if id < CORE_VALUE_MAX {
            let value = MfgValue::from_id(id).ok_or(StorageError::NotFound)?;
            if data.len() != value.size() {
                crate::log_warn!(
                    "mfg: value {} is {} bytes, got {}",
                    id,
                    value.size(),
                    data.len()
                );
                return Err(StorageError::SizeMismatch);
            }
        } else if data.len() % WORD_SIZE as usize != 0 {
            return Err(StorageError::SizeMismatch);
        }

        if id == MfgValue::Version.id() {
            self.backend.write(self.region.start + VERSION_OFFSET, data)?;
            return Ok(());
        }

        match self.layout() {
            MfgLayout::Tlv => {
                let mut tlv = Tlv::new(&mut self.backend, self.region.tlv_region());
                match tlv.lookup(id) {
                    Ok(_) => {
                        crate::log_warn!("mfg: value {} already written", id);
                        Err(StorageError::AlreadyExists)
                    }
                    Err(StorageError::NotFound) => tlv.write(id, data),
                    Err(e) => Err(e),
                }
            }
            MfgLayout::Fixed => {
                let offset = self.fixed_offset(id)?;
                if offset >= self.region.end || data.len() as u32 > self.region.end - offset {
                    crate::log_error!("mfg: value {} at {:#x} past region end", id, offset);
                    return Err(StorageError::OutOfResources);
                }
                self.backend.write(offset, data)?;
                Ok(())
            }
        }
    }

    /// Read value `id` into `buf`
    ///
    /// Never fails: a value that is absent, unresolvable or unreadable
    /// leaves `buf` zero-filled.
    pub fn read(&mut self, id: u16, buf: &mut [u8]) {
        buf.fill(0);
        if !self.read_raw(id, buf) {
            buf.fill(0);
        }
    }

    /// Stored length of value `id`, or 0 if unknown
    ///
    /// The fixed layout reports the declared size of reserved values; the
    /// TLV layout reports what was actually written.
    pub fn get_length_for_value(&mut self, id: u16) -> usize {
        match self.layout() {
            MfgLayout::Tlv => Tlv::new(&mut self.backend, self.region.tlv_region())
                .lookup(id)
                .map(|record| record.len())
                .unwrap_or(0),
            MfgLayout::Fixed => MfgValue::from_id(id).map(MfgValue::size).unwrap_or(0),
        }
    }

    /// Erase the whole region
    pub fn erase(&mut self) -> StorageResult<()> {
        crate::log_info!(
            "mfg: erasing {:#x}..{:#x}",
            self.region.start,
            self.region.end
        );
        self.backend.erase(self.region.start, self.region.len())?;
        Ok(())
    }

    /// Device id
    ///
    /// When none was provisioned, `dev_id` receives `0xBF` followed by the
    /// big-endian MCU id and `false` is returned.
    pub fn dev_id_get<D>(&mut self, mcu: &D, dev_id: &mut [u8; DEVID_SIZE]) -> bool
    where
        D: DeviceIdSource + ?Sized,
    {
        dev_id.fill(0xFF);
        self.read_raw(MfgValue::DevId.id(), dev_id);

        if dev_id.iter().all(|&b| b == 0xFF) {
            dev_id[0] = DEVID_MCU_PREFIX;
            dev_id[1..].copy_from_slice(&mcu.mcu_device_id().to_be_bytes());
            return false;
        }

        if self.is_version_1() {
            let mut wide = [0u8; DEVID_V1_LEN];
            self.read_raw(MfgValue::DevId.id(), &mut wide);
            swap_words(&mut wide);
            wide[0] = (wide[0] & DEVID_MSB_MASK) | DEVID_SIZE_5_MASK;
            dev_id.copy_from_slice(&wide[..DEVID_SIZE]);
        }

        true
    }

    /// Device serial number, `false` if none was provisioned
    pub fn serial_num_get(&mut self, serial: &mut [u8; SERIAL_NUM_SIZE]) -> bool {
        serial.fill(0xFF);
        self.read_raw(MfgValue::SerialNum.id(), serial);

        if serial.iter().all(|&b| b == 0xFF) {
            return false;
        }

        if self.is_version_1() {
            swap_words(serial);
        }
        true
    }

    /// Status flags recorded by the migrator
    pub fn flags(&mut self) -> Option<MfgFlags> {
        if self.layout() != MfgLayout::Tlv {
            return None;
        }

        let mut raw = [0u8; MfgFlags::SIZE];
        Tlv::new(&mut self.backend, self.region.tlv_region())
            .read(FLAGS_TYPE_ID, &mut raw)
            .ok()?;
        MfgFlags::from_bytes(&raw)
    }

    /// Copy value `id` into `buf`, returning whether anything was read
    ///
    /// `buf` is left as it was when the value is absent.
    fn read_raw(&mut self, id: u16, buf: &mut [u8]) -> bool {
        if buf.is_empty() {
            return false;
        }

        let result = if id == MfgValue::Version.id() {
            let len = buf.len().min(VERSION_SIZE);
            self.backend
                .read(self.region.start + VERSION_OFFSET, &mut buf[..len])
                .map_err(StorageError::from)
        } else {
            match self.layout() {
                MfgLayout::Tlv => {
                    Tlv::new(&mut self.backend, self.region.tlv_region()).read(id, buf)
                }
                MfgLayout::Fixed => self.fixed_offset(id).and_then(|offset| {
                    if offset >= self.region.end || buf.len() as u32 > self.region.end - offset {
                        return Err(StorageError::OutOfResources);
                    }
                    self.backend.read(offset, buf).map_err(StorageError::from)
                }),
            }
        };

        match result {
            Ok(()) => true,
            Err(StorageError::NotFound) => false,
            Err(e) => {
                crate::log_error!("mfg: read of value {} failed: {:?}", id, e);
                false
            }
        }
    }

    /// Absolute offset of `id` in the fixed layout
    fn fixed_offset(&self, id: u16) -> StorageResult<u32> {
        let relative = if id < CORE_VALUE_MAX {
            MfgValue::from_id(id).map(MfgValue::legacy_byte_offset)
        } else {
            self.resolver
                .map(|resolve| resolve(id))
                .filter(|&offset| offset != INVALID_OFFSET)
        };

        match relative {
            Some(offset) => Ok(self.region.start.saturating_add(offset)),
            None => {
                crate::log_warn!("mfg: no offset for value {}", id);
                Err(StorageError::NotFound)
            }
        }
    }

    fn is_version_1(&mut self) -> bool {
        matches!(self.version(), VERSION_1 | VERSION_1_RAW)
    }
}

/// Reverse the bytes of every whole 32-bit word in `buf`
fn swap_words(buf: &mut [u8]) {
    for word in buf.chunks_exact_mut(WORD_SIZE as usize) {
        word.reverse();
    }
}
