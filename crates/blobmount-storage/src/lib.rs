pub mod config;
pub mod http_util;
pub mod limiter;
pub mod listing;
pub mod multistatus;
pub mod paths;
pub mod webdav_backend;

#[cfg(test)]
mod testutil;

use std::fmt;

use blobmount_types::error::{BlobmountError, Result};

pub use config::{backend_from_config, parse_webdav_url, StorageConfig, WebdavConfig};
pub use listing::{CancelToken, NameList};
pub use webdav_backend::WebdavBackend;

/// Kind of object stored in a repository backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Config,
    Data,
    Snapshot,
    Index,
    Lock,
    Key,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileType::Config => "config",
            FileType::Data => "data",
            FileType::Snapshot => "snapshot",
            FileType::Index => "index",
            FileType::Lock => "lock",
            FileType::Key => "key",
        };
        f.write_str(s)
    }
}

/// Names one object in a backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
    pub file_type: FileType,
    pub name: String,
}

impl Handle {
    pub fn new(file_type: FileType, name: impl Into<String>) -> Self {
        Self {
            file_type,
            name: name.into(),
        }
    }

    /// Every object except the repository config needs a name, and that name
    /// must be a single path segment.
    pub fn validate(&self) -> Result<()> {
        if self.file_type == FileType::Config {
            return Ok(());
        }
        if self.name.is_empty() {
            return Err(BlobmountError::InvalidHandle(format!(
                "{} handle has an empty name",
                self.file_type
            )));
        }
        if self.name.contains('/') || self.name == "." || self.name == ".." {
            return Err(BlobmountError::InvalidHandle(format!(
                "{} handle name '{}' is not a single path segment",
                self.file_type, self.name
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "<{}>", self.file_type)
        } else {
            write!(f, "<{}/{}>", self.file_type, self.name)
        }
    }
}

/// Metadata reported by [`Backend::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
}

/// Persistence capability for repository objects.
///
/// Implementations must be safe to share across threads; the virtual file
/// engine and the repository layer call into the same backend concurrently.
pub trait Backend: Send + Sync {
    /// Human-readable location, e.g. the server URL.
    fn location(&self) -> String;

    /// Read up to `buf.len()` bytes of `h` starting at `offset` into `buf`.
    ///
    /// A negative `offset` counts from the end of the object. Returns the
    /// number of bytes written, which is less than `buf.len()` only when the
    /// object ends first.
    fn load(&self, h: &Handle, buf: &mut [u8], offset: i64) -> Result<usize>;

    /// Store the full object.
    fn save(&self, h: &Handle, data: &[u8]) -> Result<()>;

    fn stat(&self, h: &Handle) -> Result<FileInfo>;

    /// Whether the object exists. Lookup failures count as "does not exist".
    fn test(&self, file_type: FileType, name: &str) -> Result<bool>;

    fn remove(&self, file_type: FileType, name: &str) -> Result<()>;

    /// Names of all objects of `file_type`. Failures yield an empty list.
    fn list(&self, file_type: FileType, cancel: &CancelToken) -> NameList;

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_requires_name_except_config() {
        Handle::new(FileType::Config, "").validate().unwrap();
        Handle::new(FileType::Data, "abc").validate().unwrap();

        let err = Handle::new(FileType::Data, "").validate().unwrap_err();
        assert!(matches!(err, BlobmountError::InvalidHandle(_)), "got: {err}");
        assert!(err.to_string().contains("data handle"), "got: {err}");
    }

    #[test]
    fn handle_name_must_be_one_segment() {
        for name in ["..", ".", "../config", "a/b", "/abs"] {
            let err = Handle::new(FileType::Snapshot, name).validate().unwrap_err();
            assert!(matches!(err, BlobmountError::InvalidHandle(_)), "{name}: got: {err}");
        }
        Handle::new(FileType::Snapshot, "a..b").validate().unwrap();
        Handle::new(FileType::Config, "").validate().unwrap();
    }

    #[test]
    fn handle_display() {
        assert_eq!(Handle::new(FileType::Key, "k1").to_string(), "<key/k1>");
        assert_eq!(Handle::new(FileType::Config, "").to_string(), "<config>");
    }
}
