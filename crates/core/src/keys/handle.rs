//! Opaque key handle encoding

use super::KeyId;

/// Minimum buffer size able to hold a handle
pub const HANDLE_LEN: usize = 4;

/// Write the handle for `id` into `buf`.
///
/// The buffer is zeroed and the slot number is written little-endian into
/// the first [`HANDLE_LEN`] bytes. Returns `false` if the buffer is too small.
pub fn encode_handle(id: KeyId, buf: &mut [u8]) -> bool {
    if buf.len() < HANDLE_LEN {
        return false;
    }

    buf.fill(0);
    buf[..HANDLE_LEN].copy_from_slice(&id.raw().to_le_bytes());
    true
}

/// Recover the slot from a buffer written by [`encode_handle`].
///
/// Returns `None` unless the first bytes name a known slot and every byte
/// after them is zero. Raw key material is rejected this way.
pub fn decode_handle(buf: &[u8]) -> Option<KeyId> {
    if buf.len() < HANDLE_LEN {
        return None;
    }

    let raw = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let id = KeyId::from_raw(raw)?;

    if buf[HANDLE_LEN..].iter().any(|&b| b != 0) {
        return None;
    }

    Some(id)
}
