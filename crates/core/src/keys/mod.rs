//! Secure key slots
//!
//! Key material that must not sit in plaintext storage lives in a secure key
//! store, addressed by [`KeyId`]. Callers that expect the raw key bytes get an
//! opaque handle instead: a buffer holding the slot number followed by zeros.

mod handle;

pub use handle::{decode_handle, encode_handle, HANDLE_LEN};

/// First slot number used by this crate
pub const KEY_ID_USER_MIN: u32 = 0x0000_0001;

/// Secure key slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum KeyId {
    /// Device Ed25519 private key moved out of the manufacturing region
    MfgEd25519Priv = KEY_ID_USER_MIN,
    /// Device secp256r1 private key moved out of the manufacturing region
    MfgSecp256r1Priv,
    /// Network master key
    WanMaster,
    /// Application key
    AppKey,
    /// Device-to-device key
    D2d,
}

impl KeyId {
    /// Every slot, in numeric order
    pub const ALL: [KeyId; 5] = [
        KeyId::MfgEd25519Priv,
        KeyId::MfgSecp256r1Priv,
        KeyId::WanMaster,
        KeyId::AppKey,
        KeyId::D2d,
    ];

    /// One past the last slot number
    pub const LAST: u32 = KeyId::D2d as u32 + 1;

    /// Slot number
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Look up a slot by number
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.raw() == raw)
    }
}
