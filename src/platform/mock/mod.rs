//! Mock platform implementation for testing
//!
//! This module provides mock implementations of the platform traits that can
//! be used for unit testing without real flash, key storage or settings.
//!
//! # Feature Gate
//!
//! This module is available in two contexts:
//! - During test builds (`#[cfg(test)]`)
//! - When the `mock` feature is enabled
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "mock")] {
//! use tlvstore::platform::mock::MockFlash;
//! use tlvstore::platform::traits::StorageBackend;
//!
//! let mut flash = MockFlash::new();
//! flash.write(0x100, b"SID0").unwrap();
//! assert_eq!(flash.contents(0x100, 4), b"SID0");
//! # }
//! ```

#![cfg(any(test, feature = "mock"))]

mod flash;
mod key_store;
mod settings;

pub use flash::MockFlash;
pub use key_store::MockKeyStore;
pub use settings::MockSettings;
pub use tlvstore_core::traits::MockDeviceId;
