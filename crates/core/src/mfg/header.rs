//! Region start marker
//!
//! Eight bytes at offset 0 of a TLV-layout manufacturing region: the magic
//! string followed by the version, big-endian.

use super::value::{INVALID_VERSION, TLV_VERSION, VERSION_SIZE};

/// Magic string identifying a manufacturing region
pub const MFG_MAGIC: [u8; 4] = *b"SID0";

/// Manufacturing region start marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MfgHeader {
    /// Magic string, [`MFG_MAGIC`] when valid
    pub magic: [u8; 4],
    /// Raw version bytes, big-endian
    pub raw_version: [u8; VERSION_SIZE],
}

impl MfgHeader {
    /// Size of marker in bytes
    pub const SIZE: usize = 8;

    /// Create a marker reporting `version`
    pub fn new(version: u32) -> Self {
        Self {
            magic: MFG_MAGIC,
            raw_version: version.to_be_bytes(),
        }
    }

    /// Marker written by the migrator
    pub fn tlv() -> Self {
        Self::new(TLV_VERSION)
    }

    /// Serialize marker to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4..8].copy_from_slice(&self.raw_version);
        buf
    }

    /// Deserialize marker from bytes
    ///
    /// The magic is not checked here; see [`MfgHeader::is_valid`].
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }

        let mut magic = [0u8; 4];
        let mut raw_version = [0u8; VERSION_SIZE];
        magic.copy_from_slice(&buf[0..4]);
        raw_version.copy_from_slice(&buf[4..8]);

        Some(Self { magic, raw_version })
    }

    /// Version in host byte order
    pub fn version(&self) -> u32 {
        u32::from_be_bytes(self.raw_version)
    }

    /// Check if the magic string matches
    pub fn is_valid(&self) -> bool {
        self.magic == MFG_MAGIC
    }

    /// Check if the marker was never written
    pub fn is_erased(&self) -> bool {
        self.version() == INVALID_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_bytes() {
        let header = MfgHeader::tlv();
        assert_eq!(header.to_bytes(), [0x53, 0x49, 0x44, 0x30, 0x00, 0x00, 0x00, 0x08]);
        assert_eq!(header.version(), 8);
        assert!(header.is_valid());
    }

    #[test]
    fn test_marker_parse() {
        let header = MfgHeader::from_bytes(&[0x53, 0x49, 0x44, 0x30, 0, 0, 0, 7]).unwrap();
        assert_eq!(header.version(), 7);
        assert!(header.is_valid());

        let erased = MfgHeader::from_bytes(&[0xFF; 8]).unwrap();
        assert!(!erased.is_valid());
        assert!(erased.is_erased());
    }

    #[test]
    fn test_marker_short_buffer() {
        assert!(MfgHeader::from_bytes(&[0x53, 0x49, 0x44, 0x30]).is_none());
    }
}
