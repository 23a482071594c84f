use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use blobmount_types::error::{BlobmountError, Result};
use blobmount_types::BlobType;

use crate::blob_source::BlobSource;
use crate::node::Node;
use crate::pool::BufferPool;

use super::attr::{block_count, FileAttr, BLOCK_SIZE};

/// A snapshot file presented as one seekable byte stream.
///
/// Chunk sizes are looked up once, when the file is opened, so reads can map
/// an offset to a chunk without further queries. Chunk bytes are loaded on
/// first access and kept until [`release`](Self::release). Each chunk slot
/// has its own lock: concurrent reads on one handle are safe, and loads of
/// different chunks do not wait on each other.
pub struct VirtualFile {
    source: Arc<dyn BlobSource>,
    node: Node,
    owner_is_root: bool,
    sizes: Vec<u64>,
    blobs: Vec<Mutex<Option<Vec<u8>>>>,
    pool: Arc<BufferPool>,
}

impl VirtualFile {
    /// Open `node`, borrowing chunk buffers from the process-wide pool.
    ///
    /// With `owner_is_root`, [`attr`](Self::attr) leaves uid/gid unset.
    pub fn new(source: Arc<dyn BlobSource>, node: Node, owner_is_root: bool) -> Result<Self> {
        Self::with_pool(source, node, owner_is_root, BufferPool::global())
    }

    pub fn with_pool(
        source: Arc<dyn BlobSource>,
        mut node: Node,
        owner_is_root: bool,
        pool: Arc<BufferPool>,
    ) -> Result<Self> {
        tracing::debug!(
            name = %node.name,
            chunks = node.content.len(),
            "create virtual file"
        );

        let mut sizes = Vec::with_capacity(node.content.len());
        let mut total: u64 = 0;
        for (index, id) in node.content.iter().enumerate() {
            let size = source
                .lookup_blob_size(id, BlobType::Data)
                .map_err(|e| BlobmountError::ChunkSizeLookup {
                    index,
                    id: *id,
                    source: Box::new(e),
                })?;
            sizes.push(size);
            total += size;
        }

        if total != node.size {
            tracing::debug!(
                name = %node.name,
                declared = node.size,
                actual = total,
                "sizes do not match, using real size"
            );
            node.size = total;
        }

        let blobs = (0..sizes.len()).map(|_| Mutex::new(None)).collect();
        Ok(Self {
            source,
            node,
            owner_is_root,
            sizes,
            blobs,
            pool,
        })
    }

    /// The node this file was opened from, with its size corrected.
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn chunk_sizes(&self) -> &[u64] {
        &self.sizes
    }

    pub fn attr(&self) -> FileAttr {
        tracing::trace!(name = %self.node.name, "attr");
        let (uid, gid) = if self.owner_is_root {
            (None, None)
        } else {
            (Some(self.node.uid), Some(self.node.gid))
        };
        FileAttr {
            inode: self.node.inode,
            mode: self.node.mode,
            size: self.node.size,
            blocks: block_count(self.node.size),
            blksize: BLOCK_SIZE,
            uid,
            gid,
            atime: SystemTime::from(self.node.atime),
            ctime: SystemTime::from(self.node.ctime),
            mtime: SystemTime::from(self.node.mtime),
        }
    }

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// The result is shorter than `len` only at end of file. An offset past
    /// the end is an error; an offset exactly at the end yields no bytes.
    pub fn read(&self, offset: i64, len: usize) -> Result<Vec<u8>> {
        let size = self.node.size;
        tracing::debug!(name = %self.node.name, offset, len, size, "read");

        if offset > 0 && offset as u64 > size {
            tracing::debug!(name = %self.node.name, offset, size, "offset is beyond end of file");
            return Err(BlobmountError::OffsetOutOfRange { offset, size });
        }
        if size == 0 {
            return Ok(Vec::new());
        }
        if offset < 0 {
            return Err(BlobmountError::OffsetOutOfRange { offset, size });
        }

        let offset = offset as u64;
        let want = len.min(usize::try_from(size - offset).unwrap_or(usize::MAX));
        let mut out = Vec::with_capacity(want);

        // Skip chunks that end before the offset.
        let mut start = 0;
        let mut skip = offset;
        while start < self.sizes.len() && skip > self.sizes[start] {
            skip -= self.sizes[start];
            start += 1;
        }

        for index in start..self.sizes.len() {
            if out.len() >= want {
                break;
            }
            let remaining = want - out.len();
            self.with_chunk(index, |blob| {
                let from = usize::try_from(skip).unwrap_or(usize::MAX).min(blob.len());
                let avail = &blob[from..];
                out.extend_from_slice(&avail[..avail.len().min(remaining)]);
            })?;
            skip = 0;
        }

        Ok(out)
    }

    fn slot(&self, index: usize) -> MutexGuard<'_, Option<Vec<u8>>> {
        self.blobs[index]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` on the bytes of chunk `index`, loading them first if needed.
    fn with_chunk<R>(&self, index: usize, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let mut slot = self.slot(index);
        if slot.is_none() {
            *slot = Some(self.load_chunk(index)?);
        }
        Ok(f(slot.as_deref().unwrap_or_default()))
    }

    fn load_chunk(&self, index: usize) -> Result<Vec<u8>> {
        let id = &self.node.content[index];
        let size = usize::try_from(self.sizes[index]).map_err(|_| {
            BlobmountError::Other(format!(
                "chunk {index} ({id}) of {} bytes does not fit in memory",
                self.sizes[index]
            ))
        })?;
        tracing::debug!(name = %self.node.name, index, %id, size, "load chunk");

        let mut buf = self.pool.acquire();
        if buf.len() < size {
            self.pool.release(buf);
            buf = vec![0u8; size];
        }

        match self.source.load_blob(BlobType::Data, id, &mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) => {
                tracing::debug!(name = %self.node.name, index, %id, "loading chunk failed: {e}");
                self.pool.release(buf);
                Err(BlobmountError::ChunkLoad {
                    index,
                    id: *id,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Number of chunks currently held in memory.
    pub fn cached_chunks(&self) -> usize {
        (0..self.blobs.len())
            .filter(|&i| self.slot(i).is_some())
            .count()
    }

    /// Return every cached chunk buffer to the pool. Safe to call repeatedly.
    pub fn release(&self) {
        for index in 0..self.blobs.len() {
            if let Some(buf) = self.slot(index).take() {
                self.pool.release(buf);
            }
        }
    }
}

impl Drop for VirtualFile {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for VirtualFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualFile")
            .field("name", &self.node.name)
            .field("size", &self.node.size)
            .field("chunks", &self.sizes.len())
            .field("owner_is_root", &self.owner_is_root)
            .finish()
    }
}
