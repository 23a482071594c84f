use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use blobmount_types::BlobId;

/// Metadata of one regular file in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Used for diagnostics only.
    pub name: String,
    #[serde(default)]
    pub inode: u64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: DateTime<Utc>,
    pub ctime: DateTime<Utc>,
    pub mtime: DateTime<Utc>,
    /// Declared size in bytes. May disagree with the content blobs.
    pub size: u64,
    /// Data blobs in file order.
    #[serde(default)]
    pub content: Vec<BlobId>,
}

