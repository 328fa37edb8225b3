//! Platform error types
//!
//! This module defines error types for the collaborators the storage engine
//! drives: byte-addressable backends, secure key storage and the settings
//! service.

use core::fmt;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// All backend implementations map their driver-specific errors to these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlatformError {
    /// Flash or RAM backend operation failed
    Flash(FlashError),
    /// Secure key store operation failed
    KeyStore(KeyStoreError),
    /// Settings service operation failed
    Settings(SettingsError),
    /// Platform initialization failed
    InitializationFailed,
    /// Invalid configuration provided
    InvalidConfig,
    /// Resource not available
    ResourceUnavailable,
}

/// Flash-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Erase operation failed
    EraseFailed,
    /// Write operation failed
    WriteFailed,
    /// Read operation failed
    ReadFailed,
    /// Address outside the device
    InvalidAddress,
    /// Offset or length violates the device's alignment
    Unaligned,
    /// Device busy
    Busy,
}

/// Secure key store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyStoreError {
    /// No key in the requested slot
    NotFound,
    /// Key material rejected
    ImportFailed,
    /// Key generation failed
    GenerateFailed,
    /// Key could not be destroyed
    DeleteFailed,
}

/// Settings service errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// No value stored under the path
    NotFound,
    /// Backing storage has no room for the value
    NoSpace,
    /// Value could not be loaded
    ReadFailed,
    /// Value could not be saved
    WriteFailed,
    /// Value could not be removed
    DeleteFailed,
    /// Pending changes could not be committed
    CommitFailed,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Flash(e) => write!(f, "Flash error: {:?}", e),
            PlatformError::KeyStore(e) => write!(f, "Key store error: {:?}", e),
            PlatformError::Settings(e) => write!(f, "Settings error: {:?}", e),
            PlatformError::InitializationFailed => write!(f, "Platform initialization failed"),
            PlatformError::InvalidConfig => write!(f, "Invalid configuration"),
            PlatformError::ResourceUnavailable => write!(f, "Resource not available"),
        }
    }
}

impl From<FlashError> for PlatformError {
    fn from(e: FlashError) -> Self {
        PlatformError::Flash(e)
    }
}

impl From<KeyStoreError> for PlatformError {
    fn from(e: KeyStoreError) -> Self {
        PlatformError::KeyStore(e)
    }
}

impl From<SettingsError> for PlatformError {
    fn from(e: SettingsError) -> Self {
        PlatformError::Settings(e)
    }
}
