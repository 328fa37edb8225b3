//! Mock settings service for testing

use crate::platform::{error::SettingsError, traits::SettingsBackend, PlatformError, Result};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// In-memory path/value map with a byte budget
///
/// # Example
///
/// ```
/// # #[cfg(feature = "mock")] {
/// use tlvstore::platform::mock::MockSettings;
/// use tlvstore::platform::traits::SettingsBackend;
///
/// let mut settings = MockSettings::new();
/// settings.init().unwrap();
/// settings.save("ns/0001/0002", &[1, 2, 3]).unwrap();
/// assert_eq!(settings.value_len("ns/0001/0002").unwrap(), 3);
/// # }
/// ```
#[derive(Debug)]
pub struct MockSettings {
    values: BTreeMap<String, Vec<u8>>,
    capacity: usize,
    init_count: usize,
    commits: usize,
    fail_commit: bool,
    fail_reads: bool,
    fail_deletes: bool,
}

impl MockSettings {
    /// Create an empty service with a 16 KB budget
    pub fn new() -> Self {
        Self::with_capacity(16 * 1024)
    }

    /// Create an empty service holding at most `capacity` value bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: BTreeMap::new(),
            capacity,
            init_count: 0,
            commits: 0,
            fail_commit: false,
            fail_reads: false,
            fail_deletes: false,
        }
    }

    /// Stored value at `path` (for test verification)
    pub fn value(&self, path: &str) -> Option<&[u8]> {
        self.values.get(path).map(Vec::as_slice)
    }

    /// All stored paths, in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of times `init` reached the service
    pub fn init_count(&self) -> usize {
        self.init_count
    }

    /// Number of successful commits
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Make commits fail
    pub fn set_fail_commit(&mut self, fail: bool) {
        self.fail_commit = fail;
    }

    /// Make loads fail with a read error
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make deletes fail
    pub fn set_fail_deletes(&mut self, fail: bool) {
        self.fail_deletes = fail;
    }

    fn used(&self) -> usize {
        self.values.values().map(Vec::len).sum()
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBackend for MockSettings {
    fn init(&mut self) -> Result<()> {
        self.init_count += 1;
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        Ok(())
    }

    fn load(&mut self, path: &str, buf: &mut [u8]) -> Result<usize> {
        if self.fail_reads {
            return Err(SettingsError::ReadFailed.into());
        }

        let value = self.values.get(path).ok_or(SettingsError::NotFound)?;
        let len = value.len().min(buf.len());
        buf[..len].copy_from_slice(&value[..len]);
        Ok(len)
    }

    fn value_len(&mut self, path: &str) -> Result<usize> {
        self.values
            .get(path)
            .map(Vec::len)
            .ok_or(PlatformError::Settings(SettingsError::NotFound))
    }

    fn save(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let replaced = self.values.get(path).map_or(0, Vec::len);
        if self.used() - replaced + data.len() > self.capacity {
            return Err(SettingsError::NoSpace.into());
        }

        self.values.insert(String::from(path), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        if self.fail_deletes {
            return Err(SettingsError::DeleteFailed.into());
        }

        self.values.remove(path);
        Ok(())
    }

    fn delete_subtree(&mut self, prefix: &str) -> Result<()> {
        if self.fail_deletes {
            return Err(SettingsError::DeleteFailed.into());
        }

        self.values.retain(|path, _| {
            let under = path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
            !under
        });
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.fail_commit {
            return Err(SettingsError::CommitFailed.into());
        }

        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let mut settings = MockSettings::new();
        settings.save("a/0001/0001", &[1, 2, 3, 4]).unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(settings.load("a/0001/0001", &mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
    }

    #[test]
    fn test_missing_value() {
        let mut settings = MockSettings::new();
        let mut buf = [0u8; 4];
        assert_eq!(
            settings.load("a/0001/0001", &mut buf),
            Err(PlatformError::Settings(SettingsError::NotFound))
        );
        assert!(settings.delete("a/0001/0001").is_ok());
    }

    #[test]
    fn test_capacity() {
        let mut settings = MockSettings::with_capacity(8);
        settings.save("a", &[0; 6]).unwrap();
        assert_eq!(
            settings.save("b", &[0; 3]),
            Err(PlatformError::Settings(SettingsError::NoSpace))
        );
        // Replacing a value only counts the difference
        settings.save("a", &[0; 8]).unwrap();
    }

    #[test]
    fn test_delete_subtree_stops_at_separator() {
        let mut settings = MockSettings::new();
        settings.save("ns/0001/0001", &[1]).unwrap();
        settings.save("ns/0001/0002", &[2]).unwrap();
        settings.save("ns/00010/0001", &[3]).unwrap();
        settings.save("ns/0002/0001", &[4]).unwrap();

        settings.delete_subtree("ns/0001").unwrap();

        let paths: Vec<&str> = settings.paths().collect();
        assert_eq!(paths, ["ns/00010/0001", "ns/0002/0001"]);
    }
}
