use std::io::Read;

use blobmount_types::error::{BlobmountError, Result};

/// Extract the `Content-Length` header from an HTTP response.
///
/// A negative length is reported as [`BlobmountError::SizeMismatch`]; a
/// missing or unparsable header is a protocol error.
pub fn content_length(resp: &ureq::Response, context: &str) -> Result<u64> {
    let header = resp.header("Content-Length").ok_or_else(|| {
        BlobmountError::RemoteProtocol(format!("{context}: response missing Content-Length header"))
    })?;
    parse_content_length(header, context)
}

pub(crate) fn parse_content_length(header: &str, context: &str) -> Result<u64> {
    let len: i64 = header.trim().parse().map_err(|_| {
        BlobmountError::RemoteProtocol(format!(
            "{context}: invalid Content-Length header: {header}"
        ))
    })?;
    u64::try_from(len).map_err(|_| {
        BlobmountError::SizeMismatch(format!("{context}: negative content length {len}"))
    })
}

/// Fill `buf` from `reader` until it is full or the stream ends.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
