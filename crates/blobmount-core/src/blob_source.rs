use std::sync::Arc;

use blobmount_storage::{Backend, FileType, Handle};
use blobmount_types::{BlobId, BlobType, Result};

/// Read access to repository blobs, as needed by [`VirtualFile`].
///
/// [`VirtualFile`]: crate::vfs::VirtualFile
pub trait BlobSource: Send + Sync {
    /// Plaintext size of a blob.
    fn lookup_blob_size(&self, id: &BlobId, blob_type: BlobType) -> Result<u64>;

    /// Write the blob's bytes, starting at offset 0, into `buf`. Returns the
    /// number of bytes written; never more than `buf.len()`.
    fn load_blob(&self, blob_type: BlobType, id: &BlobId, buf: &mut [u8]) -> Result<usize>;
}

/// Serves blobs stored one object per blob in a [`Backend`], named by the
/// hex blob ID under the data directory.
pub struct BackendBlobSource<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: Backend + ?Sized> BackendBlobSource<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    fn handle(id: &BlobId) -> Handle {
        Handle::new(FileType::Data, id.to_hex())
    }
}

impl<B: Backend + ?Sized> BlobSource for BackendBlobSource<B> {
    fn lookup_blob_size(&self, id: &BlobId, blob_type: BlobType) -> Result<u64> {
        tracing::trace!(%id, %blob_type, "lookup blob size");
        Ok(self.backend.stat(&Self::handle(id))?.size)
    }

    fn load_blob(&self, blob_type: BlobType, id: &BlobId, buf: &mut [u8]) -> Result<usize> {
        tracing::trace!(%id, %blob_type, len = buf.len(), "load blob");
        self.backend.load(&Self::handle(id), buf, 0)
    }
}
