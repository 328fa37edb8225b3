//! Settings service trait
//!
//! Path-addressed persistence used by the key/value store. Paths are plain
//! strings; the store decides their layout.

use crate::platform::Result;

/// Path-based settings persistence
pub trait SettingsBackend {
    /// Bring up the settings service; calling it twice is harmless
    fn init(&mut self) -> Result<()>;

    /// Release the settings service
    fn deinit(&mut self) -> Result<()>;

    /// Load the value at `path` into `buf`
    ///
    /// Returns the number of bytes copied, at most `buf.len()`.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Settings(SettingsError::NotFound)` if no value exists.
    fn load(&mut self, path: &str, buf: &mut [u8]) -> Result<usize>;

    /// Size of the value stored at `path`
    fn value_len(&mut self, path: &str) -> Result<usize>;

    /// Store `data` at `path`, replacing any existing value
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Settings(SettingsError::NoSpace)` when storage is full.
    fn save(&mut self, path: &str, data: &[u8]) -> Result<()>;

    /// Remove the value at `path`; removing a missing value succeeds
    fn delete(&mut self, path: &str) -> Result<()>;

    /// Remove every value whose path lies under `prefix`
    fn delete_subtree(&mut self, prefix: &str) -> Result<()>;

    /// Flush pending changes to persistent storage
    fn commit(&mut self) -> Result<()>;
}

impl<T: SettingsBackend + ?Sized> SettingsBackend for &mut T {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn deinit(&mut self) -> Result<()> {
        (**self).deinit()
    }

    fn load(&mut self, path: &str, buf: &mut [u8]) -> Result<usize> {
        (**self).load(path, buf)
    }

    fn value_len(&mut self, path: &str) -> Result<usize> {
        (**self).value_len(path)
    }

    fn save(&mut self, path: &str, data: &[u8]) -> Result<()> {
        (**self).save(path, data)
    }

    fn delete(&mut self, path: &str) -> Result<()> {
        (**self).delete(path)
    }

    fn delete_subtree(&mut self, prefix: &str) -> Result<()> {
        (**self).delete_subtree(prefix)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }
}
