use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use blobmount_types::error::{BlobmountError, Result};

use crate::limiter::DEFAULT_CONNECTION_LIMIT;
use crate::webdav_backend::WebdavBackend;
use crate::Backend;

const WEBDAV_PREFIX: &str = "webdav:";
const MAX_CONNECTION_LIMIT: usize = 64;

fn default_connection_limit() -> usize {
    DEFAULT_CONNECTION_LIMIT
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_io_timeout_secs() -> u64 {
    300
}

/// Settings for building a storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Backend specification, e.g. `webdav:https://dav.example.com/repo`.
    pub url: String,
    /// Maximum simultaneous requests (default: 10, clamped to 1..=64).
    #[serde(default = "default_connection_limit")]
    pub connection_limit: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

impl StorageConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_limit: default_connection_limit(),
            connect_timeout_secs: default_connect_timeout_secs(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    /// Clamp `connection_limit` into the supported range, warning when the
    /// configured value had to change.
    pub fn effective_connection_limit(&self) -> usize {
        let effective = self.connection_limit.clamp(1, MAX_CONNECTION_LIMIT);
        if effective != self.connection_limit {
            tracing::warn!(
                requested = self.connection_limit,
                effective,
                "adjusted connection_limit to supported range"
            );
        }
        effective
    }
}

/// Location of a WebDAV repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebdavConfig {
    pub url: Url,
}

/// Parse a `webdav:<http(s) url>` backend specification.
pub fn parse_webdav_url(spec: &str) -> Result<WebdavConfig> {
    let rest = spec.strip_prefix(WEBDAV_PREFIX).ok_or_else(|| {
        BlobmountError::Config("invalid WebDAV backend specification".into())
    })?;
    let url = Url::parse(rest)
        .map_err(|e| BlobmountError::Config(format!("invalid WebDAV URL '{rest}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(WebdavConfig { url }),
        other => Err(BlobmountError::Config(format!(
            "unsupported WebDAV URL scheme '{other}' (expected http or https)"
        ))),
    }
}

/// Build a storage backend from its configuration.
pub fn backend_from_config(cfg: &StorageConfig) -> Result<Box<dyn Backend>> {
    if cfg.url.starts_with(WEBDAV_PREFIX) {
        let webdav = parse_webdav_url(&cfg.url)?;
        let backend = WebdavBackend::open(
            webdav,
            cfg.effective_connection_limit(),
            cfg.connect_timeout(),
            cfg.io_timeout(),
        );
        return Ok(Box::new(backend));
    }
    let scheme = cfg.url.split(':').next().unwrap_or_default();
    Err(BlobmountError::UnsupportedBackend(scheme.to_string()))
}
