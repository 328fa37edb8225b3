//! Group/key validation and path encoding

use core::fmt::Write;
use heapless::String;

/// Group value reserved by the store
pub const GROUP_INVALID: u16 = 0xFFFF;

/// Key value reserved by the store
pub const KEY_INVALID: u16 = 0;

/// Group holding protocol state, including the routed secure keys
pub const GROUP_PROTOCOL: u16 = 0x2000;

/// Group holding persisted configuration
pub const GROUP_CONFIG: u16 = 0x3456;

/// Longest path the encoder produces
pub const MAX_PATH_LEN: usize = 48;

/// Settings path buffer
pub type KvPath = String<MAX_PATH_LEN>;

/// Address of one key/value record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub group: u16,
    pub key: u16,
}

impl RecordKey {
    /// Create a record address
    pub const fn new(group: u16, key: u16) -> Self {
        Self { group, key }
    }

    /// Check the group is usable by callers
    pub const fn group_is_valid(&self) -> bool {
        self.group != GROUP_INVALID
    }

    /// Check the key is usable by callers
    pub const fn key_is_valid(&self) -> bool {
        self.key != KEY_INVALID
    }
}

/// Encode the path of a single record
///
/// Returns `None` if the namespace is too long for [`MAX_PATH_LEN`].
pub fn record_path(namespace: &str, record: RecordKey) -> Option<KvPath> {
    let mut path = KvPath::new();
    write!(path, "{}/{:04x}/{:04x}", namespace, record.group, record.key).ok()?;
    Some(path)
}

/// Encode the path prefix shared by every record in `group`
pub fn group_path(namespace: &str, group: u16) -> Option<KvPath> {
    let mut path = KvPath::new();
    write!(path, "{}/{:04x}", namespace, group).ok()?;
    Some(path)
}
