use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{TimeZone, Utc};

use blobmount_storage::{Backend, CancelToken, FileInfo, FileType, Handle, NameList};
use blobmount_types::error::{BlobmountError, Result};
use blobmount_types::{BlobId, BlobType};

use crate::blob_source::BlobSource;
use crate::node::Node;

/// Deterministic blob ID for test chunk `n`.
pub fn blob_id(n: u8) -> BlobId {
    let mut bytes = [0u8; 32];
    bytes[0] = n;
    bytes[31] = 0xAB;
    BlobId(bytes)
}

/// `len` bytes of a recognisable pattern: byte `i` is `(seed + i) % 251`.
pub fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| ((seed as usize + i) % 251) as u8).collect()
}

/// Regular file node listing `content`, declaring `size` bytes.
pub fn make_node(name: &str, content: Vec<BlobId>, size: u64) -> Node {
    let t = Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, 0).unwrap();
    Node {
        name: name.to_string(),
        inode: 42,
        mode: 0o100644,
        uid: 1000,
        gid: 100,
        atime: t,
        ctime: t,
        mtime: t,
        size,
        content,
    }
}

/// In-memory blob source that counts calls and can be told to fail.
#[derive(Default)]
pub struct MemoryBlobSource {
    blobs: Mutex<HashMap<BlobId, Vec<u8>>>,
    failing_lookups: Mutex<HashSet<BlobId>>,
    failing_loads: Mutex<HashSet<BlobId>>,
    lookups: AtomicUsize,
    loads: AtomicUsize,
}

impl MemoryBlobSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `chunks` under IDs `blob_id(0..)` and return the IDs in order.
    pub fn with_chunks(chunks: &[Vec<u8>]) -> (Self, Vec<BlobId>) {
        let source = Self::new();
        let ids = chunks
            .iter()
            .enumerate()
            .map(|(i, data)| {
                let id = blob_id(i as u8);
                source.insert(id, data.clone());
                id
            })
            .collect();
        (source, ids)
    }

    pub fn insert(&self, id: BlobId, data: Vec<u8>) {
        self.blobs.lock().unwrap().insert(id, data);
    }

    pub fn fail_lookup(&self, id: BlobId) {
        self.failing_lookups.lock().unwrap().insert(id);
    }

    pub fn fail_load(&self, id: BlobId, failing: bool) {
        let mut set = self.failing_loads.lock().unwrap();
        if failing {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl BlobSource for MemoryBlobSource {
    fn lookup_blob_size(&self, id: &BlobId, _blob_type: BlobType) -> Result<u64> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing_lookups.lock().unwrap().contains(id) {
            return Err(BlobmountError::Other(format!("index has no entry for {id}")));
        }
        self.blobs
            .lock()
            .unwrap()
            .get(id)
            .map(|data| data.len() as u64)
            .ok_or_else(|| BlobmountError::Other(format!("unknown blob {id}")))
    }

    fn load_blob(&self, _blob_type: BlobType, id: &BlobId, buf: &mut [u8]) -> Result<usize> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.failing_loads.lock().unwrap().contains(id) {
            return Err(BlobmountError::Io(std::io::Error::other("simulated read failure")));
        }
        let blobs = self.blobs.lock().unwrap();
        let data = blobs
            .get(id)
            .ok_or_else(|| BlobmountError::Other(format!("unknown blob {id}")))?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

/// In-memory repository backend. Thread-safe via Mutex.
#[derive(Default)]
pub struct MemoryBackend {
    objects: Mutex<HashMap<Handle, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn location(&self) -> String {
        "memory".to_string()
    }

    fn load(&self, h: &Handle, buf: &mut [u8], offset: i64) -> Result<usize> {
        h.validate()?;
        let objects = self.objects.lock().unwrap();
        let data = objects
            .get(h)
            .ok_or_else(|| BlobmountError::Other(format!("{h} not found")))?;
        let start = if offset < 0 {
            data.len().saturating_sub(offset.unsigned_abs() as usize)
        } else {
            (offset as usize).min(data.len())
        };
        let n = (data.len() - start).min(buf.len());
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn save(&self, h: &Handle, data: &[u8]) -> Result<()> {
        h.validate()?;
        self.objects.lock().unwrap().insert(h.clone(), data.to_vec());
        Ok(())
    }

    fn stat(&self, h: &Handle) -> Result<FileInfo> {
        h.validate()?;
        let objects = self.objects.lock().unwrap();
        let data = objects
            .get(h)
            .ok_or_else(|| BlobmountError::Other(format!("{h} not found")))?;
        Ok(FileInfo {
            size: data.len() as u64,
        })
    }

    fn test(&self, file_type: FileType, name: &str) -> Result<bool> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .contains_key(&Handle::new(file_type, name)))
    }

    fn remove(&self, file_type: FileType, name: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .remove(&Handle::new(file_type, name));
        Ok(())
    }

    fn list(&self, file_type: FileType, cancel: &CancelToken) -> NameList {
        let mut names: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|h| h.file_type == file_type)
            .map(|h| h.name.clone())
            .collect();
        names.sort();
        NameList::new(names, cancel.clone())
    }
}
