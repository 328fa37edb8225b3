//! Key/value record addressing
//!
//! Records are addressed by a 16-bit group and a 16-bit key. The settings
//! backend sees them as paths `"<namespace>/<group>/<key>"` with both numbers
//! written as four lower-case hex digits.

mod key;

pub use key::{
    group_path, record_path, KvPath, RecordKey, GROUP_CONFIG, GROUP_INVALID, GROUP_PROTOCOL,
    KEY_INVALID, MAX_PATH_LEN,
};
