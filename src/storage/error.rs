//! Storage error types
//!
//! One taxonomy for the codec and every store built on it. Argument checks
//! run first, then capacity checks, then format checks; backend failures are
//! passed through unchanged in [`StorageError::Io`].

use crate::platform::{KeyStoreError, PlatformError, SettingsError};
use core::fmt;

/// Result type for storage operations
pub type StorageResult<T> = core::result::Result<T, StorageError>;

/// Errors from record storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Empty or oversized data, reserved type or key
    InvalidArgument,
    /// Reserved group value
    OutOfRange,
    /// Record absent, or it would extend past the region end
    NotFound,
    /// Length differs from what is stored or declared
    SizeMismatch,
    /// No room left in the region for a new record
    NoSpace,
    /// Write exceeds a per-operation or region limit
    OutOfResources,
    /// Identifier already written to an immutable store
    AlreadyExists,
    /// Secure key storage refused the operation
    AccessDenied,
    /// Key/value backend could not load a record
    ReadFailed,
    /// Key/value backend could not store a record
    WriteFailed,
    /// Key/value backend could not remove a record
    EraseFailed,
    /// Key/value backend has no room left
    StorageFull,
    /// Store used before `init`
    Uninitialized,
    /// Backend failure
    Io(PlatformError),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::InvalidArgument => write!(f, "invalid argument"),
            StorageError::OutOfRange => write!(f, "group out of range"),
            StorageError::NotFound => write!(f, "record not found"),
            StorageError::SizeMismatch => write!(f, "size mismatch"),
            StorageError::NoSpace => write!(f, "no space left in region"),
            StorageError::OutOfResources => write!(f, "write exceeds storage limits"),
            StorageError::AlreadyExists => write!(f, "record already exists"),
            StorageError::AccessDenied => write!(f, "secure key storage access denied"),
            StorageError::ReadFailed => write!(f, "storage read failed"),
            StorageError::WriteFailed => write!(f, "storage write failed"),
            StorageError::EraseFailed => write!(f, "storage erase failed"),
            StorageError::StorageFull => write!(f, "storage full"),
            StorageError::Uninitialized => write!(f, "store not initialized"),
            StorageError::Io(e) => write!(f, "backend error: {}", e),
        }
    }
}

impl From<PlatformError> for StorageError {
    fn from(e: PlatformError) -> Self {
        StorageError::Io(e)
    }
}

impl StorageError {
    /// Map a settings service failure on a read path
    pub(crate) fn from_settings_read(e: PlatformError) -> Self {
        match e {
            PlatformError::Settings(SettingsError::NotFound) => StorageError::NotFound,
            _ => StorageError::ReadFailed,
        }
    }

    /// Map a settings service failure on a write path
    pub(crate) fn from_settings_write(e: PlatformError) -> Self {
        match e {
            PlatformError::Settings(SettingsError::NoSpace) => StorageError::StorageFull,
            _ => StorageError::WriteFailed,
        }
    }

    /// Map a secure key store failure on a read path
    pub(crate) fn from_key_read(e: PlatformError) -> Self {
        match e {
            PlatformError::KeyStore(KeyStoreError::NotFound) => StorageError::NotFound,
            _ => StorageError::AccessDenied,
        }
    }
}
