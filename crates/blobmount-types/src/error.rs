use thiserror::Error;

use crate::blob_id::BlobId;

pub type Result<T> = std::result::Result<T, BlobmountError>;

#[derive(Debug, Error)]
pub enum BlobmountError {
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("size lookup for chunk {index} ({id}) failed: {source}")]
    ChunkSizeLookup {
        index: usize,
        id: BlobId,
        #[source]
        source: Box<BlobmountError>,
    },

    #[error("loading chunk {index} ({id}) failed: {source}")]
    ChunkLoad {
        index: usize,
        id: BlobId,
        #[source]
        source: Box<BlobmountError>,
    },

    #[error("offset {offset} is out of range for file of size {size}")]
    OffsetOutOfRange { offset: i64, size: u64 },

    #[error("remote protocol error: {0}")]
    RemoteProtocol(String),

    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported backend: '{0}'")]
    UnsupportedBackend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl BlobmountError {
    /// The error number a kernel filesystem adapter should hand back to the
    /// calling process for this failure.
    #[cfg(unix)]
    pub fn errno(&self) -> nix::errno::Errno {
        use nix::errno::Errno;

        match self {
            BlobmountError::InvalidHandle(_) | BlobmountError::OffsetOutOfRange { .. } => {
                Errno::EINVAL
            }
            BlobmountError::Config(_) | BlobmountError::UnsupportedBackend(_) => Errno::EINVAL,
            BlobmountError::Io(e) => e
                .raw_os_error()
                .map(Errno::from_raw)
                .unwrap_or(Errno::EIO),
            _ => Errno::EIO,
        }
    }

    /// Whether this error originated in the blob source while serving a chunk.
    pub fn is_chunk_error(&self) -> bool {
        matches!(
            self,
            BlobmountError::ChunkSizeLookup { .. } | BlobmountError::ChunkLoad { .. }
        )
    }
}
