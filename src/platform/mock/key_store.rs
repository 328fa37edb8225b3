//! Mock secure key store for testing

use crate::platform::{error::KeyStoreError, traits::SecureKeyStore, Result};
use alloc::vec::Vec;
use tlvstore_core::keys::{KeyId, KEY_ID_USER_MIN};

/// Length of keys produced by [`SecureKeyStore::generate`]
const GENERATED_KEY_LEN: usize = 32;

/// In-memory key slots
///
/// # Example
///
/// ```
/// # #[cfg(feature = "mock")] {
/// use tlvstore::platform::mock::MockKeyStore;
/// use tlvstore::platform::traits::SecureKeyStore;
/// use tlvstore_core::keys::KeyId;
///
/// let mut keys = MockKeyStore::new();
/// keys.import(KeyId::AppKey, &[0x11; 16]).unwrap();
/// assert_eq!(keys.key_len(KeyId::AppKey), Some(16));
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockKeyStore {
    slots: [Option<Vec<u8>>; KeyId::ALL.len()],
    initialized: bool,
    fail_imports: bool,
    imports: usize,
}

impl MockKeyStore {
    /// Create an empty key store
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw key material in slot `id` (for test verification)
    pub fn key(&self, id: KeyId) -> Option<&[u8]> {
        self.slots[Self::index(id)].as_deref()
    }

    /// Make every subsequent import fail
    pub fn set_fail_imports(&mut self, fail: bool) {
        self.fail_imports = fail;
    }

    /// Number of successful imports
    pub fn import_count(&self) -> usize {
        self.imports
    }

    /// True once `init` has been called
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn index(id: KeyId) -> usize {
        (id.raw() - KEY_ID_USER_MIN) as usize
    }
}

impl SecureKeyStore for MockKeyStore {
    fn init(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn import(&mut self, id: KeyId, data: &[u8]) -> Result<()> {
        if self.fail_imports || data.is_empty() {
            return Err(KeyStoreError::ImportFailed.into());
        }

        self.slots[Self::index(id)] = Some(data.to_vec());
        self.imports += 1;
        Ok(())
    }

    fn generate(&mut self, id: KeyId) -> Result<()> {
        let seed = id.raw() as u8;
        let key = (0..GENERATED_KEY_LEN as u8)
            .map(|i| i.wrapping_mul(31).wrapping_add(seed))
            .collect();
        self.slots[Self::index(id)] = Some(key);
        Ok(())
    }

    fn delete(&mut self, id: KeyId) -> Result<()> {
        match self.slots[Self::index(id)].take() {
            Some(_) => Ok(()),
            None => Err(KeyStoreError::NotFound.into()),
        }
    }

    fn key_len(&self, id: KeyId) -> Option<usize> {
        self.key(id).map(<[u8]>::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::traits::key_store::{buffer_get, buffer_set};
    use crate::platform::PlatformError;

    #[test]
    fn test_import_and_delete() {
        let mut keys = MockKeyStore::new();
        keys.import(KeyId::WanMaster, &[0xA5; 16]).unwrap();
        assert_eq!(keys.key(KeyId::WanMaster), Some(&[0xA5; 16][..]));

        keys.delete(KeyId::WanMaster).unwrap();
        assert_eq!(keys.key(KeyId::WanMaster), None);
        assert_eq!(
            keys.delete(KeyId::WanMaster),
            Err(PlatformError::KeyStore(KeyStoreError::NotFound))
        );
    }

    #[test]
    fn test_import_overwrites() {
        let mut keys = MockKeyStore::new();
        keys.import(KeyId::D2d, &[1; 16]).unwrap();
        keys.import(KeyId::D2d, &[2; 32]).unwrap();
        assert_eq!(keys.key_len(KeyId::D2d), Some(32));
        assert_eq!(keys.import_count(), 2);
    }

    #[test]
    fn test_generate() {
        let mut keys = MockKeyStore::new();
        keys.generate(KeyId::AppKey).unwrap();
        assert_eq!(keys.key_len(KeyId::AppKey), Some(GENERATED_KEY_LEN));
    }

    #[test]
    fn test_failing_import() {
        let mut keys = MockKeyStore::new();
        keys.set_fail_imports(true);
        assert!(keys.import(KeyId::AppKey, &[1; 16]).is_err());
        assert_eq!(keys.key(KeyId::AppKey), None);
    }

    #[test]
    fn test_buffer_handles() {
        let mut keys = MockKeyStore::new();
        let mut buf = [0xEEu8; 16];

        assert_eq!(
            buffer_set(&keys, KeyId::WanMaster, &mut buf),
            Err(PlatformError::KeyStore(KeyStoreError::NotFound))
        );

        keys.import(KeyId::WanMaster, &[7; 16]).unwrap();
        buffer_set(&keys, KeyId::WanMaster, &mut buf).unwrap();
        assert_eq!(buffer_get(&buf), Some(KeyId::WanMaster));

        let mut small = [0u8; 2];
        assert_eq!(
            buffer_set(&keys, KeyId::WanMaster, &mut small),
            Err(PlatformError::InvalidConfig)
        );

        assert_eq!(buffer_get(&[7; 16]), None);
    }
}
