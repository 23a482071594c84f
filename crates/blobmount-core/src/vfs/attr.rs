use std::time::SystemTime;

/// Block size reported in stat.
pub const BLOCK_SIZE: u32 = 512;

/// Number of 512-byte blocks reported for a file of `size` bytes.
///
/// Always one more than `size / 512`, exact multiples included.
pub fn block_count(size: u64) -> u64 {
    size / BLOCK_SIZE as u64 + 1
}

/// Attribute record handed to the kernel for a virtual file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttr {
    pub inode: u64,
    pub mode: u32,
    pub size: u64,
    pub blocks: u64,
    pub blksize: u32,
    /// `None` leaves ownership to the kernel default.
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub atime: SystemTime,
    pub ctime: SystemTime,
    pub mtime: SystemTime,
}
