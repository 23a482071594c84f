//! Read-only files assembled from repository blobs.
//!
//! A [`VirtualFile`] is what a kernel filesystem adapter hands requests to:
//! `attr` for stat, `read` for offset reads, `release` when the last handle
//! closes.

mod attr;
mod file;

pub use attr::{block_count, FileAttr, BLOCK_SIZE};
pub use file::VirtualFile;
