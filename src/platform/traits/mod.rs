//! Platform abstraction traits
//!
//! This module defines the collaborator interfaces the storage engine consumes.

pub mod backend;
pub mod key_store;
pub mod settings;

// Re-export trait interfaces
pub use backend::StorageBackend;
pub use key_store::SecureKeyStore;
pub use settings::SettingsBackend;
pub use tlvstore_core::traits::DeviceIdSource;
