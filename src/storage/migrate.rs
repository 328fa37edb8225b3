//! Legacy manufacturing image migration
//!
//! Rebuilds a manufacturing region in the TLV layout. Two source formats are
//! understood:
//!
//! - Raw TLV (version 8 images): `[tag_hi, tag_lo, len_hi, len_lo, payload…]`
//!   records, unpadded, after the start marker
//! - Fixed offsets (version 7 and older): each value at its legacy word offset
//!
//! The new image is built in a RAM shadow of the whole region, then the
//! region is erased and written back in one call. Nothing touches the real
//! region before that point, so a failed migration leaves it as it was.
//!
//! Device private keys are moved into secure key storage when a key store is
//! supplied, and copied as plain records otherwise.
//!
//! # Example
//!
//! ```
//! use tlvstore::storage::migrate::migrate;
//! use tlvstore::storage::{RamBackend, TlvRegion};
//! use tlvstore::platform::traits::StorageBackend;
//!
//! let mut image = RamBackend::new(256);
//! image.write(0, b"SID0\x00\x00\x00\x08").unwrap();
//! image.write(8, &[0x00, 0x26, 0x00, 0x04, 0x76, 0x43, 0x74, 0x32]).unwrap();
//!
//! let region = TlvRegion::new(0, 256, 8).unwrap();
//! let report = migrate(&mut image, region, None).unwrap().unwrap();
//! assert_eq!(report.copied, 1);
//! ```

use crate::platform::traits::{SecureKeyStore, StorageBackend};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::ram::RamBackend;
use crate::storage::tlv::{Tlv, TlvRegion};
use tlvstore_core::keys::KeyId;
use tlvstore_core::mfg::{
    MfgFlags, MfgHeader, MfgValue, FLAGS_TYPE_ID, INVALID_VERSION, MAX_FLASH_WRITE_LEN, TLV_VERSION,
};
use tlvstore_core::tlv::{MAX_PAYLOAD_LEN, TYPE_EMPTY};

/// Raw record header: 2-byte tag, 2-byte length
const RAW_HEADER_SIZE: u32 = 4;

/// Outcome of a completed migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Values written as records
    pub copied: usize,
    /// Values moved into secure key storage
    pub imported: usize,
    /// Status record appended to the new image
    pub flags: MfgFlags,
}

/// Migrate `region` if it still holds a legacy image
///
/// Returns `Ok(None)` when the region is erased or already carries the
/// status record, and the migration report otherwise.
///
/// # Errors
///
/// Returns `StorageError::SizeMismatch` if the region's marker is not the
/// 8-byte manufacturing marker; see [`parse_raw_tlv`] for the rest.
pub fn migrate<B: StorageBackend>(
    backend: &mut B,
    region: TlvRegion,
    keys: Option<&mut dyn SecureKeyStore>,
) -> StorageResult<Option<MigrationReport>> {
    let mut raw = [0u8; MfgHeader::SIZE];
    let mut tlv = Tlv::new(&mut *backend, region);
    tlv.read_start_marker(&mut raw)?;
    let version = MfgHeader::from_bytes(&raw)
        .map(|header| header.version())
        .unwrap_or(INVALID_VERSION);

    match version {
        INVALID_VERSION => {
            crate::log_debug!("migrate: region erased, nothing to do");
            Ok(None)
        }
        TLV_VERSION => match tlv.lookup(FLAGS_TYPE_ID) {
            Ok(_) => {
                crate::log_debug!("migrate: region already migrated");
                Ok(None)
            }
            Err(StorageError::NotFound) => parse_raw_tlv(backend, region, keys).map(Some),
            Err(e) => Err(e),
        },
        _ => parse_const_offsets(backend, region, keys).map(Some),
    }
}

/// Rebuild a raw TLV image (version 8) in place
///
/// Reading stops at the empty tag, at a record running past the region end,
/// or when less than a header remains. Zero-length records are dropped.
///
/// # Errors
///
/// - `StorageError::InvalidArgument`: empty region, or a payload longer than
///   255 bytes
/// - `StorageError::NoSpace`: the rebuilt image does not fit
/// - `StorageError::AccessDenied`: secure key import refused
/// - `StorageError::Io`: source read, erase or final write failed
///   (a failed final write leaves the region erased)
pub fn parse_raw_tlv<B: StorageBackend>(
    backend: &mut B,
    region: TlvRegion,
    keys: Option<&mut dyn SecureKeyStore>,
) -> StorageResult<MigrationReport> {
    let mut shadow = Shadow::new(&region, keys)?;
    let mut payload = [0u8; MAX_PAYLOAD_LEN];
    let mut offset = region.data_start();

    while fits(offset, RAW_HEADER_SIZE, region.end) {
        let mut header = [0u8; RAW_HEADER_SIZE as usize];
        backend.read(offset, &mut header)?;
        offset += RAW_HEADER_SIZE;

        let tag = u16::from_be_bytes([header[0], header[1]]);
        if tag == TYPE_EMPTY {
            break;
        }

        let len = u16::from_be_bytes([header[2], header[3]]) as usize;
        if len > MAX_PAYLOAD_LEN {
            crate::log_error!("migrate: value {:#x} has {} bytes", tag, len);
            return Err(StorageError::InvalidArgument);
        }
        if !fits(offset, len as u32, region.end) {
            crate::log_warn!("migrate: value {:#x} runs past region end", tag);
            break;
        }
        if len == 0 {
            continue;
        }

        backend.read(offset, &mut payload[..len])?;
        offset += len as u32;

        shadow.append(tag, &payload[..len])?;
    }

    shadow.flush(backend, &region)
}

/// Rebuild a fixed-offset image (version 7 and older) in place
///
/// Values that are still erased, or that lie past the region end, are
/// skipped. The version word and device id are not carried over.
///
/// # Errors
///
/// Same as [`parse_raw_tlv`].
pub fn parse_const_offsets<B: StorageBackend>(
    backend: &mut B,
    region: TlvRegion,
    keys: Option<&mut dyn SecureKeyStore>,
) -> StorageResult<MigrationReport> {
    let mut shadow = Shadow::new(&region, keys)?;
    let mut payload = [0u8; MAX_FLASH_WRITE_LEN];

    for value in MfgValue::ALL.iter().copied().filter(|v| has_legacy_slot(*v)) {
        let size = value.size();
        let offset = region.start.saturating_add(value.legacy_byte_offset());
        if size > MAX_FLASH_WRITE_LEN || !fits(offset, size as u32, region.end) {
            crate::log_trace!("migrate: value {} outside region", value.id());
            continue;
        }

        let buf = &mut payload[..size];
        backend.read(offset, buf)?;
        if buf.iter().all(|&b| b == 0xFF) {
            continue;
        }

        shadow.append(value.id(), buf)?;
    }

    shadow.flush(backend, &region)
}

/// Values stored at a fixed offset by legacy images
fn has_legacy_slot(value: MfgValue) -> bool {
    !matches!(value, MfgValue::Version | MfgValue::DevId)
}

/// Secure key slot for a private key value
fn secure_slot(id: u16) -> Option<KeyId> {
    match MfgValue::from_id(id)? {
        MfgValue::DevicePrivEd25519 => Some(KeyId::MfgEd25519Priv),
        MfgValue::DevicePrivP256r1 => Some(KeyId::MfgSecp256r1Priv),
        _ => None,
    }
}

fn fits(offset: u32, len: u32, end: u32) -> bool {
    offset.checked_add(len).is_some_and(|stop| stop <= end)
}

/// In-memory copy of the region being rebuilt
struct Shadow<'k> {
    tlv: Tlv<RamBackend>,
    keys: Option<&'k mut dyn SecureKeyStore>,
    copied: usize,
    imported: usize,
}

impl<'k> Shadow<'k> {
    fn new(region: &TlvRegion, keys: Option<&'k mut dyn SecureKeyStore>) -> StorageResult<Self> {
        if region.is_empty() {
            return Err(StorageError::InvalidArgument);
        }

        let size = region.len();
        let shadow_region = TlvRegion::new(0, size, region.marker_size)?;
        let mut tlv = Tlv::new(RamBackend::new(size as usize), shadow_region);
        tlv.write_start_marker(&MfgHeader::tlv().to_bytes())
            .inspect_err(|_| crate::log_error!("migrate: marker does not fit region marker"))?;

        Ok(Self {
            tlv,
            keys,
            copied: 0,
            imported: 0,
        })
    }

    fn append(&mut self, id: u16, payload: &[u8]) -> StorageResult<()> {
        if let (Some(keys), Some(key_id)) = (self.keys.as_deref_mut(), secure_slot(id)) {
            keys.import(key_id, payload).map_err(|e| {
                crate::log_error!("migrate: key {} import failed: {:?}", key_id.raw(), e);
                StorageError::AccessDenied
            })?;
            crate::log_info!("migrate: key {} imported", key_id.raw());
            self.imported += 1;
            return Ok(());
        }

        self.tlv.write(id, payload)?;
        self.copied += 1;
        Ok(())
    }

    /// Append the status record and replace the region with the shadow
    fn flush<B: StorageBackend>(
        mut self,
        backend: &mut B,
        region: &TlvRegion,
    ) -> StorageResult<MigrationReport> {
        let mut flags = MfgFlags::INITIALIZED;
        if self.keys.is_some() {
            flags |= MfgFlags::KEYS_IN_SECURE_STORAGE;
        }
        self.tlv.write(FLAGS_TYPE_ID, &flags.to_bytes())?;

        let image = self.tlv.into_inner().into_vec();
        backend.erase(region.start, region.len())?;
        backend.write(region.start, &image)?;

        crate::log_info!(
            "migrate: {} values copied, {} keys imported",
            self.copied,
            self.imported
        );
        Ok(MigrationReport {
            copied: self.copied,
            imported: self.imported,
            flags,
        })
    }
}
