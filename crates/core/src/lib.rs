//! tlvstore_core - Wire formats and identifier tables for the tlvstore engine
//!
//! This crate holds everything about the on-flash and on-disk formats that
//! can be checked on the host without a backend: record headers, the
//! manufacturing value table, key/value paths and secure key handles.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: No std library dependencies, no allocation
//! - **Trait abstractions**: Platform services injected via traits
//!
//! # Modules
//!
//! - [`tlv`]: Record header layout and padding rules
//! - [`mfg`]: Manufacturing value identifiers, sizes, start marker and flags
//! - [`kv`]: Group/key addressing and settings path encoding
//! - [`keys`]: Secure key slots and the opaque key handle encoding
//! - [`traits`]: Platform-agnostic trait abstractions (DeviceIdSource)

#![no_std]

pub mod keys;
pub mod kv;
pub mod mfg;
pub mod tlv;
pub mod traits;
