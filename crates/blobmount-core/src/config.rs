use std::path::Path;

use serde::{Deserialize, Serialize};

use blobmount_storage::StorageConfig;
use blobmount_types::error::{BlobmountError, Result};

/// Settings for serving a snapshot as a mounted filesystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountConfig {
    pub repository: StorageConfig,
    /// Report files as owned by the mounting user instead of the uid/gid
    /// recorded in the snapshot.
    #[serde(default)]
    pub owner_is_root: bool,
}

impl MountConfig {
    fn validate(&self) -> Result<()> {
        if self.repository.url.trim().is_empty() {
            return Err(BlobmountError::Config(
                "'repository.url' must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Read and validate a YAML mount config.
pub fn load_config(path: &Path) -> Result<MountConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        BlobmountError::Config(format!("cannot read '{}': {e}", path.display()))
    })?;
    let config: MountConfig = serde_yaml::from_str(&contents).map_err(|e| {
        BlobmountError::Config(format!("invalid config '{}': {e}", path.display()))
    })?;
    config.validate()?;
    tracing::debug!(path = %path.display(), url = %config.repository.url, "loaded mount config");
    Ok(config)
}
