//! Manufacturing value identifiers
//!
//! Identifiers below [`CORE_VALUE_MAX`] are owned by the protocol and each has
//! a fixed size. Identifiers at or above it belong to the application and are
//! resolved to an offset at runtime.

/// First identifier available to applications
pub const CORE_VALUE_MAX: u16 = 4000;

/// Sentinel returned by offset resolvers for unknown identifiers
pub const INVALID_OFFSET: u32 = u32::MAX;

/// Largest single manufacturing write (one flash program unit batch)
pub const MAX_FLASH_WRITE_LEN: usize = 64;

/// Legacy layouts address values in 32-bit words
pub const WORD_SIZE: u32 = 4;

/// Size of the version field
pub const VERSION_SIZE: usize = 4;

/// Version reported by regions in TLV layout
pub const TLV_VERSION: u32 = 8;

/// Version read back from an erased region
pub const INVALID_VERSION: u32 = 0xFFFF_FFFF;

/// Size of the device identifier
pub const DEVID_SIZE: usize = 5;

/// Size of the serial number
pub const SERIAL_NUM_SIZE: usize = 17;

/// Bytes spanned by the fixed-offset layout, device id included
pub const LEGACY_LAYOUT_LEN: u32 = 356 * WORD_SIZE;

/// Reserved manufacturing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum MfgValue {
    DevId = 1,
    Version = 2,
    SerialNum = 3,
    Smsn = 4,
    AppPubEd25519 = 5,
    DevicePrivEd25519 = 6,
    DevicePubEd25519 = 7,
    DevicePubEd25519Signature = 8,
    DevicePrivP256r1 = 9,
    DevicePubP256r1 = 10,
    DevicePubP256r1Signature = 11,
    DakPubEd25519 = 12,
    DakPubEd25519Signature = 13,
    DakEd25519Serial = 14,
    DakPubP256r1 = 15,
    DakPubP256r1Signature = 16,
    DakP256r1Serial = 17,
    ProductPubEd25519 = 18,
    ProductPubEd25519Signature = 19,
    ProductEd25519Serial = 20,
    ProductPubP256r1 = 21,
    ProductPubP256r1Signature = 22,
    ProductP256r1Serial = 23,
    ManPubEd25519 = 24,
    ManPubEd25519Signature = 25,
    ManEd25519Serial = 26,
    ManPubP256r1 = 27,
    ManPubP256r1Signature = 28,
    ManP256r1Serial = 29,
    SwPubEd25519 = 30,
    SwPubEd25519Signature = 31,
    SwEd25519Serial = 32,
    SwPubP256r1 = 33,
    SwPubP256r1Signature = 34,
    SwP256r1Serial = 35,
    AmznPubEd25519 = 36,
    AmznPubP256r1 = 37,
    Apid = 38,
}

impl MfgValue {
    /// Every reserved value, in identifier order
    pub const ALL: [MfgValue; 38] = [
        MfgValue::DevId,
        MfgValue::Version,
        MfgValue::SerialNum,
        MfgValue::Smsn,
        MfgValue::AppPubEd25519,
        MfgValue::DevicePrivEd25519,
        MfgValue::DevicePubEd25519,
        MfgValue::DevicePubEd25519Signature,
        MfgValue::DevicePrivP256r1,
        MfgValue::DevicePubP256r1,
        MfgValue::DevicePubP256r1Signature,
        MfgValue::DakPubEd25519,
        MfgValue::DakPubEd25519Signature,
        MfgValue::DakEd25519Serial,
        MfgValue::DakPubP256r1,
        MfgValue::DakPubP256r1Signature,
        MfgValue::DakP256r1Serial,
        MfgValue::ProductPubEd25519,
        MfgValue::ProductPubEd25519Signature,
        MfgValue::ProductEd25519Serial,
        MfgValue::ProductPubP256r1,
        MfgValue::ProductPubP256r1Signature,
        MfgValue::ProductP256r1Serial,
        MfgValue::ManPubEd25519,
        MfgValue::ManPubEd25519Signature,
        MfgValue::ManEd25519Serial,
        MfgValue::ManPubP256r1,
        MfgValue::ManPubP256r1Signature,
        MfgValue::ManP256r1Serial,
        MfgValue::SwPubEd25519,
        MfgValue::SwPubEd25519Signature,
        MfgValue::SwEd25519Serial,
        MfgValue::SwPubP256r1,
        MfgValue::SwPubP256r1Signature,
        MfgValue::SwP256r1Serial,
        MfgValue::AmznPubEd25519,
        MfgValue::AmznPubP256r1,
        MfgValue::Apid,
    ];

    /// Numeric identifier
    pub const fn id(self) -> u16 {
        self as u16
    }

    /// Look up a reserved value by identifier
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|value| value.id() == id)
    }

    /// Fixed size of the value in bytes
    pub const fn size(self) -> usize {
        use MfgValue::*;
        match self {
            DevId => DEVID_SIZE,
            Version => VERSION_SIZE,
            SerialNum => SERIAL_NUM_SIZE,
            Smsn | AppPubEd25519 | DevicePrivEd25519 | DevicePubEd25519 | DevicePrivP256r1 => 32,
            DakPubEd25519 | ProductPubEd25519 | ManPubEd25519 | SwPubEd25519 | AmznPubEd25519 => 32,
            DevicePubEd25519Signature | DevicePubP256r1 | DevicePubP256r1Signature => 64,
            DakPubEd25519Signature | DakPubP256r1 | DakPubP256r1Signature => 64,
            ProductPubEd25519Signature | ProductPubP256r1 | ProductPubP256r1Signature => 64,
            ManPubEd25519Signature | ManPubP256r1 | ManPubP256r1Signature => 64,
            SwPubEd25519Signature | SwPubP256r1 | SwPubP256r1Signature => 64,
            AmznPubP256r1 => 64,
            DakEd25519Serial | DakP256r1Serial | ProductEd25519Serial | ProductP256r1Serial => 4,
            ManEd25519Serial | ManP256r1Serial | SwEd25519Serial | SwP256r1Serial => 4,
            Apid => 4,
        }
    }

    /// Word offset of the value in the fixed-offset layout
    ///
    /// Word 0 holds the magic string and word 1 the version, the same bytes
    /// a TLV-layout region uses for its start marker.
    pub const fn legacy_word_offset(self) -> u32 {
        use MfgValue::*;
        match self {
            Version => 1,
            SerialNum => 2,
            Smsn => 8,
            Apid => 16,
            AppPubEd25519 => 18,
            DevicePrivEd25519 => 26,
            DevicePubEd25519 => 34,
            DevicePubEd25519Signature => 42,
            DevicePrivP256r1 => 58,
            DevicePubP256r1 => 66,
            DevicePubP256r1Signature => 82,
            DakPubEd25519 => 98,
            DakPubEd25519Signature => 106,
            DakEd25519Serial => 122,
            DakPubP256r1 => 123,
            DakPubP256r1Signature => 139,
            DakP256r1Serial => 155,
            ProductPubEd25519 => 156,
            ProductPubEd25519Signature => 164,
            ProductEd25519Serial => 180,
            ProductPubP256r1 => 181,
            ProductPubP256r1Signature => 197,
            ProductP256r1Serial => 213,
            ManPubEd25519 => 214,
            ManPubEd25519Signature => 222,
            ManEd25519Serial => 238,
            ManPubP256r1 => 239,
            ManPubP256r1Signature => 255,
            ManP256r1Serial => 271,
            SwPubEd25519 => 272,
            SwPubEd25519Signature => 280,
            SwEd25519Serial => 296,
            SwPubP256r1 => 297,
            SwPubP256r1Signature => 313,
            SwP256r1Serial => 329,
            AmznPubEd25519 => 330,
            AmznPubP256r1 => 338,
            DevId => 354,
        }
    }

    /// Byte offset of the value in the fixed-offset layout
    pub const fn legacy_byte_offset(self) -> u32 {
        self.legacy_word_offset() * WORD_SIZE
    }

    /// Private keys that belong in secure key storage rather than plaintext
    pub const fn is_private_key(self) -> bool {
        matches!(self, MfgValue::DevicePrivEd25519 | MfgValue::DevicePrivP256r1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_identifier_has_one_entry() {
        for (index, value) in MfgValue::ALL.iter().enumerate() {
            assert_eq!(value.id() as usize, index + 1);
            assert_eq!(MfgValue::from_id(value.id()), Some(*value));
        }

        let matches = |id: u16| MfgValue::ALL.iter().filter(|v| v.id() == id).count();
        for id in 1..=38u16 {
            assert_eq!(matches(id), 1);
        }
    }

    #[test]
    fn test_unreserved_identifiers() {
        assert_eq!(MfgValue::from_id(0), None);
        assert_eq!(MfgValue::from_id(39), None);
        assert_eq!(MfgValue::from_id(CORE_VALUE_MAX), None);
    }

    #[test]
    fn test_sizes() {
        assert_eq!(MfgValue::DevId.size(), 5);
        assert_eq!(MfgValue::Version.size(), 4);
        assert_eq!(MfgValue::SerialNum.size(), 17);
        assert_eq!(MfgValue::Smsn.size(), 32);
        assert_eq!(MfgValue::DevicePubP256r1.size(), 64);
        assert_eq!(MfgValue::DakEd25519Serial.size(), 4);
        assert_eq!(MfgValue::AmznPubEd25519.size(), 32);
        assert_eq!(MfgValue::Apid.size(), 4);

        for value in MfgValue::ALL {
            assert!(value.size() > 0);
            assert!(value.size() <= MAX_FLASH_WRITE_LEN);
        }
    }

    #[test]
    fn test_legacy_offsets_do_not_overlap() {
        let mut values = MfgValue::ALL;
        values.sort_unstable_by_key(|v| v.legacy_word_offset());

        // Words 0 and 1 are magic and version
        assert_eq!(values[0], MfgValue::Version);
        assert_eq!(values[0].legacy_byte_offset(), 4);

        for pair in values.windows(2) {
            let end = pair[0].legacy_byte_offset() + pair[0].size() as u32;
            assert!(
                end <= pair[1].legacy_byte_offset(),
                "{:?} overlaps {:?}",
                pair[0],
                pair[1]
            );
        }

        let last = values[values.len() - 1];
        assert!(last.legacy_byte_offset() + 8 <= LEGACY_LAYOUT_LEN);
    }

    #[test]
    fn test_private_keys() {
        let private: usize = MfgValue::ALL.iter().filter(|v| v.is_private_key()).count();
        assert_eq!(private, 2);
        assert!(MfgValue::DevicePrivEd25519.is_private_key());
        assert!(MfgValue::DevicePrivP256r1.is_private_key());
    }
}
