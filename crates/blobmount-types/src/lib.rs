pub mod blob_id;
pub mod error;

pub use blob_id::{BlobId, BlobType};
pub use error::{BlobmountError, Result};
