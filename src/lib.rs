#![cfg_attr(not(test), no_std)]

//! tlvstore - TLV record storage engine for embedded devices
//!
//! This library provides a Tag-Length-Value record codec over an abstract
//! byte-addressable backend, the manufacturing and key/value stores built on
//! it, and a one-shot migrator for legacy manufacturing images.

extern crate alloc;

// Platform abstraction layer (backends, key storage, settings)
pub mod platform;

// Logging macros
pub mod core;

// Record codec and stores
pub mod storage;
