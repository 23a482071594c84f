use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

/// Capacity of a pooled chunk buffer. Most data blobs fit.
pub const DEFAULT_BLOB_SIZE: usize = 128 * 1024;

static GLOBAL_POOL: LazyLock<Arc<BufferPool>> =
    LazyLock::new(|| Arc::new(BufferPool::new(DEFAULT_BLOB_SIZE)));

/// Free list of reusable chunk buffers.
///
/// A buffer is owned either by the pool (idle) or by whoever called
/// [`acquire`](Self::acquire), never both: it moves out on acquire and back
/// in on [`release`](Self::release). Only buffers of the pool's own capacity
/// are kept; anything else handed back is dropped, so idle memory stays at
/// `idle() × capacity`. The free list grows with demand and has no fairness
/// guarantee.
#[derive(Debug)]
pub struct BufferPool {
    capacity: usize,
    idle: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            idle: Mutex::new(Vec::new()),
        }
    }

    /// The process-wide pool shared by every virtual file.
    pub fn global() -> Arc<BufferPool> {
        Arc::clone(&GLOBAL_POOL)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffers currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.idle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take an idle buffer, or allocate a new one. The returned buffer's
    /// length equals its capacity.
    pub fn acquire(&self) -> Vec<u8> {
        let reused = self.lock().pop();
        match reused {
            Some(mut buf) => {
                let cap = buf.capacity();
                buf.resize(cap, 0);
                buf
            }
            None => vec![0u8; self.capacity],
        }
    }

    /// Hand a buffer back. Buffers with a different capacity are dropped.
    pub fn release(&self, buf: Vec<u8>) {
        if buf.capacity() != self.capacity {
            return;
        }
        self.lock().push(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_BLOB_SIZE)
    }
}
