//! Record storage
//!
//! - [`tlv`]: TLV codec over any [`StorageBackend`](crate::platform::traits::StorageBackend)
//! - [`mfg`]: Manufacturing value store (fixed-offset and TLV layouts)
//! - [`kv`]: Group/key store over a settings service, with secure key routing
//! - [`migrate`]: One-shot rebuild of legacy manufacturing images
//! - [`ram`]: RAM backend, used for migration shadows and tests
//!
//! Everything here is synchronous and single-owner. Callers sharing a store
//! between tasks must serialize access themselves.

pub mod error;
pub mod kv;
pub mod mfg;
pub mod migrate;
pub mod ram;
pub mod tlv;

pub use error::{StorageError, StorageResult};
pub use kv::{KvConfig, KvStore, SecureKeyFilter, SecureKeyRoute, DEFAULT_SECURE_KEYS};
pub use mfg::{MfgLayout, MfgRegion, MfgStore, ValueResolver};
pub use migrate::{migrate, parse_const_offsets, parse_raw_tlv, MigrationReport};
pub use ram::RamBackend;
pub use tlv::{Tlv, TlvRecord, TlvRegion};
