//! Store status record

use bitflags::bitflags;

use super::value::CORE_VALUE_MAX;

/// Record type of the status flags
///
/// Sits far above the application range so it never collides with values
/// copied from a legacy image.
pub const FLAGS_TYPE_ID: u16 = 0x6FFD;

bitflags! {
    /// Manufacturing store status
    ///
    /// Stored as 4 bytes: the flag byte followed by three zero bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MfgFlags: u8 {
        /// Region was rebuilt into TLV layout
        const INITIALIZED = 0x80;
        /// Private keys were moved to secure key storage
        const KEYS_IN_SECURE_STORAGE = 0x40;
    }
}

impl MfgFlags {
    /// Size of the serialized record payload
    pub const SIZE: usize = 4;

    /// Serialize flags to bytes
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.bits(), 0, 0, 0]
    }

    /// Deserialize flags from bytes, ignoring unknown bits
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        buf.first().map(|&bits| Self::from_bits_truncate(bits))
    }
}

const _: () = assert!(FLAGS_TYPE_ID > CORE_VALUE_MAX);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_layout() {
        assert_eq!(MfgFlags::INITIALIZED.to_bytes(), [0x80, 0, 0, 0]);
        let both = MfgFlags::INITIALIZED | MfgFlags::KEYS_IN_SECURE_STORAGE;
        assert_eq!(both.to_bytes(), [0xC0, 0, 0, 0]);
    }

    #[test]
    fn test_flags_parse() {
        let flags = MfgFlags::from_bytes(&[0xC0, 0, 0, 0]).unwrap();
        assert!(flags.contains(MfgFlags::INITIALIZED));
        assert!(flags.contains(MfgFlags::KEYS_IN_SECURE_STORAGE));

        let flags = MfgFlags::from_bytes(&[0x81]).unwrap();
        assert_eq!(flags, MfgFlags::INITIALIZED);

        assert!(MfgFlags::from_bytes(&[]).is_none());
    }
}
