//! Record header codec

/// Payloads are padded to a multiple of this many bytes
pub const DATA_ALIGN: usize = 4;

/// Fill value for padding bytes and erased storage
pub const PADDING_BYTE: u8 = 0xFF;

/// Type value of an erased (never written) header
pub const TYPE_EMPTY: u16 = 0xFFFF;

/// Largest payload a single record can carry (8-bit length field)
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

/// Number of padding bytes that follow a payload of `len` bytes.
///
/// Always in `0..=3`.
pub const fn padding_for(len: usize) -> u8 {
    ((DATA_ALIGN - len % DATA_ALIGN) % DATA_ALIGN) as u8
}

/// Record header
///
/// Serialized big-endian as `[type_hi, type_lo, padding, payload_len]`.
/// This layout is shared with devices already in the field and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvHeader {
    /// Record type
    pub ty: u16,
    /// Padding bytes following the payload
    pub padding: u8,
    /// Payload length in bytes
    pub data_size: u8,
}

impl TlvHeader {
    /// Size of header in bytes
    pub const SIZE: usize = 4;

    /// Create a header for a payload of `len` bytes.
    ///
    /// Returns `None` when `len` does not fit the 8-bit length field.
    pub fn new(ty: u16, len: usize) -> Option<Self> {
        if len > MAX_PAYLOAD_LEN {
            return None;
        }

        Some(Self {
            ty,
            padding: padding_for(len),
            data_size: len as u8,
        })
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let ty = self.ty.to_be_bytes();
        [ty[0], ty[1], self.padding, self.data_size]
    }

    /// Deserialize header from bytes
    ///
    /// No validation is done on the padding field; erased storage decodes as
    /// a header of type [`TYPE_EMPTY`].
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE {
            return None;
        }

        Some(Self {
            ty: u16::from_be_bytes([buf[0], buf[1]]),
            padding: buf[2],
            data_size: buf[3],
        })
    }

    /// Bytes occupied by payload plus padding
    pub fn stored_len(&self) -> u32 {
        self.data_size as u32 + self.padding as u32
    }

    /// Bytes occupied by the whole record, header included
    pub fn record_len(&self) -> u32 {
        Self::SIZE as u32 + self.stored_len()
    }

    /// True if this header marks a slot that may be written
    ///
    /// Erased headers and zero-length headers are both treated as free.
    pub fn is_free(&self) -> bool {
        self.ty == TYPE_EMPTY || self.data_size == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_cycle() {
        assert_eq!(padding_for(0), 0);
        assert_eq!(padding_for(1), 3);
        assert_eq!(padding_for(2), 2);
        assert_eq!(padding_for(3), 1);
        assert_eq!(padding_for(4), 0);
        assert_eq!(padding_for(255), 1);
    }

    #[test]
    fn test_padding_keeps_alignment() {
        for len in 0..=MAX_PAYLOAD_LEN {
            let pad = padding_for(len) as usize;
            assert!(pad <= 3);
            assert_eq!((len + pad) % DATA_ALIGN, 0);
        }
    }

    #[test]
    fn test_header_layout() {
        let header = TlvHeader::new(0x0001, 3).unwrap();
        assert_eq!(header.to_bytes(), [0x00, 0x01, 0x01, 0x03]);

        let header = TlvHeader::new(0x0101, 4).unwrap();
        assert_eq!(header.to_bytes(), [0x01, 0x01, 0x00, 0x04]);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = TlvHeader::new(0x6FFD, 4).unwrap();
        let parsed = TlvHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(header, parsed);
        assert_eq!(parsed.record_len(), 8);
    }

    #[test]
    fn test_header_rejects_long_payload() {
        assert!(TlvHeader::new(1, 256).is_none());
        assert!(TlvHeader::new(1, 255).is_some());
    }

    #[test]
    fn test_erased_header_is_free() {
        let header = TlvHeader::from_bytes(&[0xFF; 4]).unwrap();
        assert_eq!(header.ty, TYPE_EMPTY);
        assert!(header.is_free());

        let header = TlvHeader::from_bytes(&[0x00, 0x05, 0x00, 0x00]).unwrap();
        assert!(header.is_free());

        let header = TlvHeader::from_bytes(&[0x00, 0x05, 0x00, 0x04]).unwrap();
        assert!(!header.is_free());
    }

    #[test]
    fn test_short_buffer() {
        assert!(TlvHeader::from_bytes(&[0x00, 0x01, 0x00]).is_none());
    }
}
