//! Platform abstraction layer
//!
//! This module provides the collaborator interfaces the storage engine is
//! written against, an adapter for `embedded-storage` flash drivers, and
//! in-memory mocks for host testing.

pub mod error;
pub mod nor_flash;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use error::{FlashError, KeyStoreError, PlatformError, Result, SettingsError};
pub use nor_flash::{MultiwriteBackend, NorFlashBackend};
pub use traits::{DeviceIdSource, SecureKeyStore, SettingsBackend, StorageBackend};
