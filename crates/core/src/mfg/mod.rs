//! Manufacturing store formats
//!
//! - [`value`]: Reserved value identifiers, their fixed sizes and legacy offsets
//! - [`header`]: Start marker written at the beginning of a TLV-layout region
//! - [`flags`]: Status record appended by the legacy-format migrator

pub mod flags;
pub mod header;
pub mod value;

pub use flags::{MfgFlags, FLAGS_TYPE_ID};
pub use header::{MfgHeader, MFG_MAGIC};
pub use value::{
    MfgValue, CORE_VALUE_MAX, DEVID_SIZE, INVALID_OFFSET, INVALID_VERSION, LEGACY_LAYOUT_LEN,
    MAX_FLASH_WRITE_LEN, SERIAL_NUM_SIZE, TLV_VERSION, VERSION_SIZE, WORD_SIZE,
};
