//! Group/key record store over a settings service
//!
//! Records are addressed by a 16-bit group and a 16-bit key and persisted at
//! `"<namespace>/<gggg>/<kkkk>"`. Selected records hold key material: a
//! [`SecureKeyFilter`] catches them before they reach the settings service
//! and sends them to secure key storage instead.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "mock")] {
//! use tlvstore::platform::mock::{MockKeyStore, MockSettings};
//! use tlvstore::storage::{KvConfig, KvStore};
//!
//! let mut store = KvStore::new(MockSettings::new(), MockKeyStore::new(), KvConfig::DEFAULT);
//! store.init().unwrap();
//!
//! store.record_set(0x0001, 0x0002, &[1, 2, 3]).unwrap();
//!
//! let mut buf = [0u8; 8];
//! let len = store.record_get(0x0001, 0x0002, &mut buf).unwrap();
//! assert_eq!(&buf[..len], &[1, 2, 3]);
//! # }
//! ```

use crate::platform::traits::key_store::{buffer_get, buffer_set};
use crate::platform::traits::{SecureKeyStore, SettingsBackend};
use crate::platform::{KeyStoreError, PlatformError};
use crate::storage::error::{StorageError, StorageResult};
use tlvstore_core::keys::{KeyId, HANDLE_LEN};
use tlvstore_core::kv::{group_path, record_path, KvPath, RecordKey, GROUP_PROTOCOL};

/// Default settings namespace
pub const DEFAULT_NAMESPACE: &str = "tlvstore/kv";

/// Largest value accepted by default
pub const DEFAULT_MAX_VALUE_LEN: usize = 4064;

/// A record whose value lives in secure key storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecureKeyRoute {
    pub group: u16,
    pub key: u16,
    pub key_id: KeyId,
}

impl SecureKeyRoute {
    pub const fn new(group: u16, key: u16, key_id: KeyId) -> Self {
        Self { group, key, key_id }
    }
}

/// Protocol keys kept out of plaintext storage
pub const DEFAULT_SECURE_KEYS: [SecureKeyRoute; 3] = [
    SecureKeyRoute::new(GROUP_PROTOCOL, 0x0001, KeyId::WanMaster),
    SecureKeyRoute::new(GROUP_PROTOCOL, 0x0002, KeyId::AppKey),
    SecureKeyRoute::new(GROUP_PROTOCOL, 0x0003, KeyId::D2d),
];

/// Table of records redirected to secure key storage
#[derive(Debug, Clone, Copy)]
pub struct SecureKeyFilter<'a> {
    routes: &'a [SecureKeyRoute],
}

impl<'a> SecureKeyFilter<'a> {
    pub const fn new(routes: &'a [SecureKeyRoute]) -> Self {
        Self { routes }
    }

    /// Secure key slot for `record`, if it is intercepted
    pub fn route(&self, record: RecordKey) -> Option<KeyId> {
        self.routes
            .iter()
            .find(|route| route.group == record.group && route.key == record.key)
            .map(|route| route.key_id)
    }

    /// Secure key slots routed from `group`
    pub fn group_keys(&self, group: u16) -> impl Iterator<Item = KeyId> + 'a {
        self.routes
            .iter()
            .filter(move |route| route.group == group)
            .map(|route| route.key_id)
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Key/value store configuration
#[derive(Debug, Clone, Copy)]
pub struct KvConfig<'a> {
    /// Leading path component of every record
    pub namespace: &'a str,
    /// Largest value `record_set` accepts
    pub max_value_len: usize,
    /// Records redirected to secure key storage
    pub secure_keys: &'a [SecureKeyRoute],
}

impl KvConfig<'static> {
    pub const DEFAULT: Self = Self {
        namespace: DEFAULT_NAMESPACE,
        max_value_len: DEFAULT_MAX_VALUE_LEN,
        secure_keys: &DEFAULT_SECURE_KEYS,
    };
}

impl Default for KvConfig<'static> {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Key/value store
///
/// Owns its settings service and key store; pass `&mut` references to share
/// them with other code.
pub struct KvStore<'a, S, K> {
    settings: S,
    keys: K,
    config: KvConfig<'a>,
    initialized: bool,
}

impl<'a, S: SettingsBackend, K: SecureKeyStore> KvStore<'a, S, K> {
    pub fn new(settings: S, keys: K, config: KvConfig<'a>) -> Self {
        Self {
            settings,
            keys,
            config,
            initialized: false,
        }
    }

    pub fn config(&self) -> &KvConfig<'a> {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn keys_mut(&mut self) -> &mut K {
        &mut self.keys
    }

    /// Bring up the settings service (and key store, if any key is routed)
    ///
    /// Calling `init` on an initialized store does nothing.
    pub fn init(&mut self) -> StorageResult<()> {
        if self.initialized {
            return Ok(());
        }

        self.settings.init()?;
        if !self.filter().is_empty() {
            self.keys.init()?;
        }

        self.initialized = true;
        crate::log_debug!("kv: initialized");
        Ok(())
    }

    /// Release the settings service; harmless when not initialized
    pub fn deinit(&mut self) -> StorageResult<()> {
        if !self.initialized {
            return Ok(());
        }

        self.settings.deinit()?;
        self.initialized = false;
        Ok(())
    }

    /// Read a record into `buf`, returning the number of bytes copied
    ///
    /// A routed record yields its opaque key handle instead of key material.
    ///
    /// # Errors
    ///
    /// - `StorageError::OutOfRange` / `StorageError::InvalidArgument`: reserved
    ///   group or key, or an empty buffer
    /// - `StorageError::NotFound`: no such record
    /// - `StorageError::ReadFailed`: the settings service failed
    pub fn record_get(&mut self, group: u16, key: u16, buf: &mut [u8]) -> StorageResult<usize> {
        let record = validate(group, key)?;
        if buf.is_empty() {
            return Err(StorageError::InvalidArgument);
        }
        self.ensure_init()?;

        if let Some(key_id) = self.filter().route(record) {
            if buf.len() < HANDLE_LEN {
                return Err(StorageError::InvalidArgument);
            }
            buffer_set(&self.keys, key_id, buf).map_err(StorageError::from_key_read)?;
            return Ok(HANDLE_LEN);
        }

        let path = self.path(record)?;
        self.settings
            .load(&path, buf)
            .map_err(StorageError::from_settings_read)
    }

    /// Stored length of a record
    pub fn record_get_len(&mut self, group: u16, key: u16) -> StorageResult<usize> {
        let record = validate(group, key)?;
        self.ensure_init()?;

        if let Some(key_id) = self.filter().route(record) {
            return self.keys.key_len(key_id).ok_or(StorageError::NotFound);
        }

        let path = self.path(record)?;
        self.settings
            .value_len(&path)
            .map_err(StorageError::from_settings_read)
    }

    /// Store a record, replacing any previous value
    ///
    /// A routed record is imported into secure key storage. Writing back the
    /// `HANDLE_LEN` bytes that `record_get` returned for the same record
    /// changes nothing. Any `HANDLE_LEN`-byte payload that decodes as a
    /// handle is treated as one, so raw key material of that length cannot
    /// be stored on a routed record.
    ///
    /// # Errors
    ///
    /// - `StorageError::InvalidArgument`: empty data, reserved key, or the
    ///   handle of a different key
    /// - `StorageError::OutOfResources`: value above `max_value_len`
    /// - `StorageError::AccessDenied`: secure key import refused
    /// - `StorageError::StorageFull`: the settings service is full
    /// - `StorageError::WriteFailed`: save or commit failed
    pub fn record_set(&mut self, group: u16, key: u16, data: &[u8]) -> StorageResult<()> {
        let record = validate(group, key)?;
        if data.is_empty() {
            return Err(StorageError::InvalidArgument);
        }
        if data.len() > self.config.max_value_len {
            return Err(StorageError::OutOfResources);
        }
        self.ensure_init()?;

        if let Some(key_id) = self.filter().route(record) {
            return self.import_key(key_id, data);
        }

        let path = self.path(record)?;
        self.settings
            .save(&path, data)
            .map_err(StorageError::from_settings_write)?;
        self.commit(StorageError::WriteFailed)
    }

    /// Remove a record; removing an absent record succeeds
    pub fn record_delete(&mut self, group: u16, key: u16) -> StorageResult<()> {
        let record = validate(group, key)?;
        self.ensure_init()?;

        if let Some(key_id) = self.filter().route(record) {
            return self.destroy_key(key_id);
        }

        let path = self.path(record)?;
        self.settings.delete(&path).map_err(|e| {
            crate::log_error!("kv: delete failed: {:?}", e);
            StorageError::EraseFailed
        })?;
        self.commit(StorageError::EraseFailed)
    }

    /// Remove every record in `group`, routed keys included
    pub fn group_delete(&mut self, group: u16) -> StorageResult<()> {
        validate(group, 1)?;
        self.ensure_init()?;

        let filter = self.filter();
        for key_id in filter.group_keys(group) {
            self.destroy_key(key_id)?;
        }

        let prefix = group_path(self.config.namespace, group).ok_or(StorageError::InvalidArgument)?;
        self.settings.delete_subtree(&prefix).map_err(|e| {
            crate::log_error!("kv: group {:#x} delete failed: {:?}", group, e);
            StorageError::EraseFailed
        })?;
        self.commit(StorageError::EraseFailed)
    }

    fn filter(&self) -> SecureKeyFilter<'a> {
        SecureKeyFilter::new(self.config.secure_keys)
    }

    fn ensure_init(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::Uninitialized)
        }
    }

    fn path(&self, record: RecordKey) -> StorageResult<KvPath> {
        record_path(self.config.namespace, record).ok_or(StorageError::InvalidArgument)
    }

    fn commit(&mut self, on_error: StorageError) -> StorageResult<()> {
        self.settings.commit().map_err(|e| {
            crate::log_error!("kv: commit failed: {:?}", e);
            on_error
        })
    }

    fn import_key(&mut self, key_id: KeyId, data: &[u8]) -> StorageResult<()> {
        if data.len() == HANDLE_LEN {
            match buffer_get(data) {
                Some(id) if id == key_id => return Ok(()),
                Some(_) => return Err(StorageError::InvalidArgument),
                None => {}
            }
        }

        self.keys.import(key_id, data).map_err(|e| {
            crate::log_error!("kv: key import failed: {:?}", e);
            StorageError::AccessDenied
        })?;
        crate::log_info!("kv: key {} moved to secure storage", key_id.raw());
        Ok(())
    }

    fn destroy_key(&mut self, key_id: KeyId) -> StorageResult<()> {
        match self.keys.delete(key_id) {
            Ok(()) | Err(PlatformError::KeyStore(KeyStoreError::NotFound)) => Ok(()),
            Err(e) => {
                crate::log_error!("kv: key {} destroy failed: {:?}", key_id.raw(), e);
                Err(StorageError::EraseFailed)
            }
        }
    }
}

fn validate(group: u16, key: u16) -> StorageResult<RecordKey> {
    let record = RecordKey::new(group, key);
    if !record.group_is_valid() {
        return Err(StorageError::OutOfRange);
    }
    if !record.key_is_valid() {
        return Err(StorageError::InvalidArgument);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockKeyStore, MockSettings};
    use tlvstore_core::keys::encode_handle;
    use tlvstore_core::kv::{GROUP_CONFIG, GROUP_INVALID, KEY_INVALID};

    type TestStore = KvStore<'static, MockSettings, MockKeyStore>;

    fn store() -> TestStore {
        let mut store = KvStore::new(MockSettings::new(), MockKeyStore::new(), KvConfig::DEFAULT);
        store.init().unwrap();
        store
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut store = store();
        store.record_set(GROUP_CONFIG, 0x0010, &[1, 2, 3, 4, 5]).unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(store.record_get(GROUP_CONFIG, 0x0010, &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], &[1, 2, 3, 4, 5]);
        assert_eq!(store.record_get_len(GROUP_CONFIG, 0x0010).unwrap(), 5);

        assert_eq!(
            store.settings_mut().value("tlvstore/kv/3456/0010"),
            Some(&[1, 2, 3, 4, 5][..])
        );
    }

    #[test]
    fn test_set_replaces() {
        let mut store = store();
        store.record_set(1, 1, &[1; 8]).unwrap();
        store.record_set(1, 1, &[2; 2]).unwrap();
        assert_eq!(store.record_get_len(1, 1).unwrap(), 2);
    }

    #[test]
    fn test_reserved_group_and_key() {
        let mut store = store();
        let mut buf = [0u8; 4];

        assert_eq!(store.record_set(GROUP_INVALID, 1, &[1]), Err(StorageError::OutOfRange));
        assert_eq!(store.record_set(1, KEY_INVALID, &[1]), Err(StorageError::InvalidArgument));
        assert_eq!(store.record_get(GROUP_INVALID, 1, &mut buf), Err(StorageError::OutOfRange));
        assert_eq!(store.group_delete(GROUP_INVALID), Err(StorageError::OutOfRange));
    }

    #[test]
    fn test_argument_errors() {
        let mut store = store();
        assert_eq!(store.record_set(1, 1, &[]), Err(StorageError::InvalidArgument));
        assert_eq!(store.record_get(1, 1, &mut []), Err(StorageError::InvalidArgument));

        let too_long = alloc::vec![0u8; DEFAULT_MAX_VALUE_LEN + 1];
        assert_eq!(store.record_set(1, 1, &too_long), Err(StorageError::OutOfResources));
    }

    #[test]
    fn test_uninitialized() {
        let mut store: TestStore =
            KvStore::new(MockSettings::new(), MockKeyStore::new(), KvConfig::DEFAULT);
        assert_eq!(store.record_set(1, 1, &[1]), Err(StorageError::Uninitialized));
        assert_eq!(store.record_get_len(1, 1), Err(StorageError::Uninitialized));
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut store = store();
        store.init().unwrap();
        assert_eq!(store.settings_mut().init_count(), 1);
        assert!(store.keys_mut().is_initialized());

        store.deinit().unwrap();
        store.deinit().unwrap();
        assert!(!store.is_initialized());

        store.init().unwrap();
        assert_eq!(store.settings_mut().init_count(), 2);
    }

    #[test]
    fn test_missing_record() {
        let mut store = store();
        let mut buf = [0u8; 4];
        assert_eq!(store.record_get(1, 2, &mut buf), Err(StorageError::NotFound));
        assert_eq!(store.record_get_len(1, 2), Err(StorageError::NotFound));
        assert!(store.record_delete(1, 2).is_ok());
    }

    #[test]
    fn test_backend_failures_mapped() {
        let mut store = store();
        store.record_set(1, 1, &[1]).unwrap();

        store.settings_mut().set_fail_reads(true);
        let mut buf = [0u8; 4];
        assert_eq!(store.record_get(1, 1, &mut buf), Err(StorageError::ReadFailed));

        store.settings_mut().set_fail_commit(true);
        assert_eq!(store.record_set(1, 1, &[2]), Err(StorageError::WriteFailed));

        store.settings_mut().set_fail_deletes(true);
        assert_eq!(store.record_delete(1, 1), Err(StorageError::EraseFailed));
        assert_eq!(store.group_delete(1), Err(StorageError::EraseFailed));
    }

    #[test]
    fn test_storage_full() {
        let mut store = KvStore::new(
            MockSettings::with_capacity(16),
            MockKeyStore::new(),
            KvConfig::DEFAULT,
        );
        store.init().unwrap();
        store.record_set(1, 1, &[0; 12]).unwrap();
        assert_eq!(store.record_set(1, 2, &[0; 8]), Err(StorageError::StorageFull));
    }

    #[test]
    fn test_group_delete() {
        let mut store = store();
        store.record_set(0x0100, 1, &[1]).unwrap();
        store.record_set(0x0100, 2, &[2]).unwrap();
        store.record_set(0x1000, 1, &[3]).unwrap();

        store.group_delete(0x0100).unwrap();
        assert_eq!(store.record_get_len(0x0100, 1), Err(StorageError::NotFound));
        assert_eq!(store.record_get_len(0x0100, 2), Err(StorageError::NotFound));
        assert_eq!(store.record_get_len(0x1000, 1).unwrap(), 1);
    }

    #[test]
    fn test_secure_key_import() {
        let mut store = store();
        let key = [0x5Au8; 16];
        store.record_set(GROUP_PROTOCOL, 0x0001, &key).unwrap();

        assert_eq!(store.keys_mut().key(KeyId::WanMaster), Some(&key[..]));
        assert_eq!(store.settings_mut().paths().count(), 0);
        assert_eq!(store.record_get_len(GROUP_PROTOCOL, 0x0001).unwrap(), 16);

        let mut buf = [0xEEu8; 16];
        assert_eq!(store.record_get(GROUP_PROTOCOL, 0x0001, &mut buf).unwrap(), HANDLE_LEN);
        assert_eq!(buffer_get(&buf), Some(KeyId::WanMaster));
    }

    #[test]
    fn test_secure_key_handle_roundtrip() {
        let mut store = store();
        store.record_set(GROUP_PROTOCOL, 0x0002, &[0x11; 16]).unwrap();

        let mut handle = [0u8; 16];
        store.record_get(GROUP_PROTOCOL, 0x0002, &mut handle).unwrap();

        // Writing the handle back keeps the imported key
        store.record_set(GROUP_PROTOCOL, 0x0002, &handle[..HANDLE_LEN]).unwrap();
        assert_eq!(store.keys_mut().key(KeyId::AppKey), Some(&[0x11; 16][..]));
        assert_eq!(store.keys_mut().import_count(), 1);

        // Another slot's handle is refused
        assert_eq!(
            store.record_set(GROUP_PROTOCOL, 0x0001, &handle[..HANDLE_LEN]),
            Err(StorageError::InvalidArgument)
        );
    }

    #[test]
    fn test_key_resembling_handle_is_imported() {
        let mut store = store();

        // Zero-padded past the handle, so only its length tells it apart
        let mut key = [0u8; 16];
        encode_handle(KeyId::WanMaster, &mut key);
        store.record_set(GROUP_PROTOCOL, 0x0001, &key).unwrap();
        assert_eq!(store.keys_mut().key(KeyId::WanMaster), Some(&key[..]));

        let mut other = [0u8; 16];
        encode_handle(KeyId::AppKey, &mut other);
        store.record_set(GROUP_PROTOCOL, 0x0001, &other).unwrap();
        assert_eq!(store.keys_mut().key(KeyId::WanMaster), Some(&other[..]));
        assert_eq!(store.keys_mut().import_count(), 2);
    }

    #[test]
    fn test_secure_key_errors() {
        let mut store = store();
        let mut buf = [0u8; 16];
        assert_eq!(
            store.record_get(GROUP_PROTOCOL, 0x0003, &mut buf),
            Err(StorageError::NotFound)
        );

        store.keys_mut().set_fail_imports(true);
        assert_eq!(
            store.record_set(GROUP_PROTOCOL, 0x0003, &[1; 16]),
            Err(StorageError::AccessDenied)
        );

        let mut short = [0u8; 2];
        assert_eq!(
            store.record_get(GROUP_PROTOCOL, 0x0003, &mut short),
            Err(StorageError::InvalidArgument)
        );
    }

    #[test]
    fn test_secure_key_delete() {
        let mut store = store();
        store.record_set(GROUP_PROTOCOL, 0x0001, &[1; 16]).unwrap();
        store.record_set(GROUP_PROTOCOL, 0x0002, &[2; 16]).unwrap();
        store.record_set(GROUP_PROTOCOL, 0x0010, &[3; 4]).unwrap();

        store.record_delete(GROUP_PROTOCOL, 0x0001).unwrap();
        assert_eq!(store.keys_mut().key(KeyId::WanMaster), None);
        assert!(store.record_delete(GROUP_PROTOCOL, 0x0001).is_ok());

        store.group_delete(GROUP_PROTOCOL).unwrap();
        assert_eq!(store.keys_mut().key(KeyId::AppKey), None);
        assert_eq!(store.record_get_len(GROUP_PROTOCOL, 0x0010), Err(StorageError::NotFound));
    }

    #[test]
    fn test_custom_routes_and_namespace() {
        const ROUTES: [SecureKeyRoute; 1] = [SecureKeyRoute::new(0x0042, 0x0007, KeyId::D2d)];
        let config = KvConfig {
            namespace: "app",
            max_value_len: 32,
            secure_keys: &ROUTES,
        };
        let mut store = KvStore::new(MockSettings::new(), MockKeyStore::new(), config);
        store.init().unwrap();

        store.record_set(GROUP_PROTOCOL, 0x0001, &[9; 16]).unwrap();
        assert_eq!(store.settings_mut().value("app/2000/0001"), Some(&[9; 16][..]));

        store.record_set(0x0042, 0x0007, &[7; 16]).unwrap();
        assert_eq!(store.keys_mut().key(KeyId::D2d), Some(&[7; 16][..]));

        assert_eq!(store.record_set(1, 1, &[0; 33]), Err(StorageError::OutOfResources));
    }

    #[test]
    fn test_empty_route_table_skips_key_store() {
        let config = KvConfig {
            secure_keys: &[],
            ..KvConfig::DEFAULT
        };
        let mut store = KvStore::new(MockSettings::new(), MockKeyStore::new(), config);
        store.init().unwrap();
        assert!(!store.keys_mut().is_initialized());

        store.record_set(GROUP_PROTOCOL, 0x0001, &[1; 16]).unwrap();
        assert!(store.settings_mut().value("tlvstore/kv/2000/0001").is_some());
    }
}
