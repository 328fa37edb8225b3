//! Device identifier source
//!
//! When the manufacturing region holds no device id, one is derived from the
//! MCU's factory-programmed unique id register.

use core::cell::Cell;

/// Platform-agnostic access to the MCU unique id.
///
/// # Example
///
/// ```
/// use tlvstore_core::traits::{DeviceIdSource, MockDeviceId};
///
/// let source = MockDeviceId::new(0x33AA_BB99);
/// assert_eq!(source.mcu_device_id(), 0x33AA_BB99);
/// ```
pub trait DeviceIdSource {
    /// Returns the first word of the MCU unique id.
    fn mcu_device_id(&self) -> u32;
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

/// Mock id source returning a settable value.
#[derive(Clone, Default)]
pub struct MockDeviceId {
    id: Cell<u32>,
}

impl MockDeviceId {
    /// Creates a source returning `id`.
    pub fn new(id: u32) -> Self {
        Self { id: Cell::new(id) }
    }

    /// Changes the returned id.
    pub fn set(&self, id: u32) {
        self.id.set(id);
    }
}

impl DeviceIdSource for MockDeviceId {
    fn mcu_device_id(&self) -> u32 {
        self.id.get()
    }
}
