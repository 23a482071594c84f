pub mod blob_source;
pub mod config;
pub mod node;
pub mod pool;
pub mod vfs;

pub use blobmount_types::error::{BlobmountError, Result};

#[cfg(test)]
mod testutil;
