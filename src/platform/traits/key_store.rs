//! Secure key store trait
//!
//! Key material addressed by [`KeyId`] lives outside plaintext storage. The
//! store imports, generates and destroys keys; callers only ever see the
//! opaque handle produced by [`buffer_set`].

use crate::platform::{error::KeyStoreError, PlatformError, Result};
use tlvstore_core::keys::{decode_handle, encode_handle, KeyId, HANDLE_LEN};

/// Secure key storage
pub trait SecureKeyStore {
    /// Prepare the key store for use
    fn init(&mut self) -> Result<()>;

    /// Store `data` as the key in slot `id`, replacing any existing key
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::KeyStore(KeyStoreError::ImportFailed)` if the
    /// material is rejected.
    fn import(&mut self, id: KeyId, data: &[u8]) -> Result<()>;

    /// Generate a fresh key in slot `id`, replacing any existing key
    fn generate(&mut self, id: KeyId) -> Result<()>;

    /// Destroy the key in slot `id`
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::KeyStore(KeyStoreError::NotFound)` if the slot is empty.
    fn delete(&mut self, id: KeyId) -> Result<()>;

    /// Length of the key material in slot `id`, or `None` if the slot is empty
    fn key_len(&self, id: KeyId) -> Option<usize>;
}

impl<T: SecureKeyStore + ?Sized> SecureKeyStore for &mut T {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn import(&mut self, id: KeyId, data: &[u8]) -> Result<()> {
        (**self).import(id, data)
    }

    fn generate(&mut self, id: KeyId) -> Result<()> {
        (**self).generate(id)
    }

    fn delete(&mut self, id: KeyId) -> Result<()> {
        (**self).delete(id)
    }

    fn key_len(&self, id: KeyId) -> Option<usize> {
        (**self).key_len(id)
    }
}

/// Fill `buf` with the opaque handle of the key in slot `id`
///
/// # Errors
///
/// Returns `PlatformError::InvalidConfig` if `buf` is too small for a handle.
/// Returns `PlatformError::KeyStore(KeyStoreError::NotFound)` if the slot is empty.
pub fn buffer_set<K: SecureKeyStore + ?Sized>(keys: &K, id: KeyId, buf: &mut [u8]) -> Result<()> {
    if buf.len() < HANDLE_LEN {
        return Err(PlatformError::InvalidConfig);
    }

    if keys.key_len(id).is_none() {
        return Err(KeyStoreError::NotFound.into());
    }

    encode_handle(id, buf);
    Ok(())
}

/// Recover the slot named by a handle in `buf`
///
/// Returns `None` when `buf` holds anything other than a handle.
pub fn buffer_get(buf: &[u8]) -> Option<KeyId> {
    decode_handle(buf)
}
