//! Core traits for platform-agnostic storage functionality.
//!
//! This module provides trait abstractions that decouple the storage formats
//! from the hardware they run on.
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Hardware implementations live with the application

pub mod device_id;

pub use device_id::{DeviceIdSource, MockDeviceId};
