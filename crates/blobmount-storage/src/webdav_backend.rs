use std::io::Read;
use std::time::Duration;

use url::Url;

use blobmount_types::error::{BlobmountError, Result};

use crate::config::WebdavConfig;
use crate::http_util::{content_length, read_full};
use crate::limiter::{ConnectionLimiter, DEFAULT_CONNECTION_LIMIT};
use crate::listing::{CancelToken, NameList};
use crate::multistatus::{entry_name, parse_hrefs};
use crate::paths::{collection_url, resource_url};
use crate::{Backend, FileInfo, FileType, Handle};

/// Storage backend speaking plain WebDAV over HTTP(S).
///
/// Requests are not retried. At most `connection_limit` requests are in
/// flight at once; a permit is held only until the response head arrives.
pub struct WebdavBackend {
    url: Url,
    agent: ureq::Agent,
    limiter: ConnectionLimiter,
}

impl WebdavBackend {
    pub fn open(
        cfg: WebdavConfig,
        connection_limit: usize,
        connect_timeout: Duration,
        io_timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout_read(io_timeout)
            .timeout_write(io_timeout)
            .build();

        Self {
            url: cfg.url,
            agent,
            limiter: ConnectionLimiter::new(connection_limit),
        }
    }

    pub fn with_defaults(cfg: WebdavConfig) -> Self {
        Self::open(
            cfg,
            DEFAULT_CONNECTION_LIMIT,
            Duration::from_secs(30),
            Duration::from_secs(300),
        )
    }

    /// Issue `req` under a connection permit. HTTP error statuses come back
    /// as ordinary responses so each operation can apply its own status rule.
    fn send(&self, op: &str, req: ureq::Request, body: Option<&[u8]>) -> Result<ureq::Response> {
        let result = {
            let _permit = self.limiter.acquire();
            match body {
                Some(data) => req.send_bytes(data),
                None => req.call(),
            }
        };
        match result {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(_, resp)) => Ok(resp),
            Err(ureq::Error::Transport(t)) => Err(BlobmountError::Io(std::io::Error::other(
                format!("WebDAV {op}: {t}"),
            ))),
        }
    }

    fn unexpected_status(op: &str, status: u16, target: &str) -> BlobmountError {
        BlobmountError::RemoteProtocol(format!(
            "{op}: unexpected HTTP response code {status} for {target}"
        ))
    }

    /// Turn a negative offset into one counted from the end of the object.
    fn resolve_offset(&self, h: &Handle, offset: i64) -> Result<u64> {
        if offset >= 0 {
            return Ok(offset as u64);
        }
        let size = self.stat(h)?.size;
        let back = offset.unsigned_abs();
        Ok(if back > size { 0 } else { size - back })
    }

    fn fetch_listing(&self, url: &str) -> Result<Vec<String>> {
        let req = self.agent.request("PROPFIND", url).set("Depth", "0");
        let resp = self.send("PROPFIND", req, None)?;
        let status = resp.status();
        if !(200..300).contains(&status) {
            return Err(Self::unexpected_status("List", status, url));
        }
        let body = resp.into_string().map_err(BlobmountError::Io)?;
        let hrefs = parse_hrefs(&body)?;
        Ok(hrefs
            .iter()
            .map(|href| entry_name(href).to_string())
            .collect())
    }
}

impl Backend for WebdavBackend {
    fn location(&self) -> String {
        self.url.to_string()
    }

    fn load(&self, h: &Handle, buf: &mut [u8], offset: i64) -> Result<usize> {
        h.validate()?;
        if buf.is_empty() {
            return Ok(0);
        }
        let offset = self.resolve_offset(h, offset)?;
        let url = resource_url(&self.url, h);
        let end = offset.saturating_add(buf.len() as u64 - 1);
        tracing::debug!(handle = %h, offset, len = buf.len(), "WebDAV GET");

        let req = self
            .agent
            .get(&url)
            .set("Range", &format!("bytes={offset}-{end}"));
        let resp = self.send("GET", req, None)?;
        let status = resp.status();
        let mut reader = resp.into_reader();
        match status {
            206 => {}
            // Range ignored: the body starts at the beginning of the object.
            200 => {
                std::io::copy(&mut reader.by_ref().take(offset), &mut std::io::sink())?;
            }
            _ => return Err(Self::unexpected_status("Load", status, &url)),
        }
        Ok(read_full(&mut reader, buf)?)
    }

    fn save(&self, h: &Handle, data: &[u8]) -> Result<()> {
        h.validate()?;
        let url = resource_url(&self.url, h);
        tracing::debug!(handle = %h, len = data.len(), "WebDAV PUT");

        let req = self.agent.put(&url).set("Translate", "f");
        let resp = self.send("PUT", req, Some(data))?;
        if resp.status() != 201 {
            return Err(Self::unexpected_status("Save", resp.status(), &url));
        }
        Ok(())
    }

    fn stat(&self, h: &Handle) -> Result<FileInfo> {
        h.validate()?;
        let url = resource_url(&self.url, h);
        tracing::debug!(handle = %h, "WebDAV HEAD");

        let resp = self.send("HEAD", self.agent.head(&url), None)?;
        if resp.status() != 200 {
            return Err(Self::unexpected_status("Stat", resp.status(), &url));
        }
        let size = content_length(&resp, &format!("Stat {h}"))?;
        Ok(FileInfo { size })
    }

    fn test(&self, file_type: FileType, name: &str) -> Result<bool> {
        match self.stat(&Handle::new(file_type, name)) {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!(%file_type, name, "treating failed stat as missing: {e}");
                Ok(false)
            }
        }
    }

    fn remove(&self, file_type: FileType, name: &str) -> Result<()> {
        let h = Handle::new(file_type, name);
        h.validate()?;
        let url = resource_url(&self.url, &h);
        tracing::debug!(handle = %h, "WebDAV DELETE");

        let resp = self.send("DELETE", self.agent.delete(&url), None)?;
        if resp.status() != 200 {
            return Err(Self::unexpected_status("Remove", resp.status(), &url));
        }
        Ok(())
    }

    fn list(&self, file_type: FileType, cancel: &CancelToken) -> NameList {
        let url = collection_url(&self.url, file_type);
        tracing::debug!(%file_type, url = %url, "WebDAV PROPFIND");

        match self.fetch_listing(&url) {
            Ok(names) => NameList::new(names, cancel.clone()),
            Err(e) => {
                tracing::warn!(%file_type, "listing {url} failed: {e}");
                NameList::empty()
            }
        }
    }
}
