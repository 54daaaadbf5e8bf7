//! Locate a wallet archive on disk, downloading it first when it lives in remote storage.

use super::blob::{BlobStore, run_until_complete};
use crate::error::{Result, StoreError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tracing::{debug, info};

/// Where an uploaded wallet archive lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// The reference is a path on the local filesystem.
    #[default]
    Local,
    /// The reference is `flow_id/filename` in a remote blob store.
    Remote,
}

/// Split a remote reference of the form `flow_id/filename`.
pub fn parse_storage_path(reference: &str) -> Option<(&str, &str)> {
    let (flow_id, filename) = reference.split_once('/')?;
    if flow_id.is_empty() || filename.is_empty() || filename.contains('/') {
        return None;
    }
    Some((flow_id, filename))
}

/// Local wallet archive, possibly a temporary download.
///
/// A downloaded archive is deleted when this value is dropped.
#[derive(Debug)]
pub struct ResolvedWallet {
    pub(super) path: PathBuf,
    pub(super) download: Option<TempPath>,
}

impl ResolvedWallet {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the archive was fetched from remote storage.
    pub fn is_download(&self) -> bool {
        self.download.is_some()
    }
}

pub struct WalletResolver {
    blob_store: Option<Arc<dyn BlobStore>>,
    scratch_dir: PathBuf,
}

impl WalletResolver {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            blob_store: None,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn with_blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn resolve(&self, reference: &str, storage: StorageMode) -> Result<ResolvedWallet> {
        if reference.trim().is_empty() {
            return Err(StoreError::Validation("Wallet file is required".into()));
        }

        match storage {
            StorageMode::Local => {
                let path = PathBuf::from(reference);
                if !path.exists() {
                    return Err(StoreError::NotFound(path));
                }
                debug!("Using local wallet archive {}", path.display());
                Ok(ResolvedWallet {
                    path,
                    download: None,
                })
            }
            StorageMode::Remote => self.download(reference),
        }
    }

    fn download(&self, reference: &str) -> Result<ResolvedWallet> {
        let (flow_id, filename) = parse_storage_path(reference).ok_or_else(|| {
            StoreError::Validation(format!(
                "Invalid storage path format: {reference}. Expected 'flow_id/filename'"
            ))
        })?;
        let store = self.blob_store.as_ref().ok_or_else(|| {
            StoreError::Validation("Remote wallet storage requires a configured blob store".into())
        })?;

        let content = run_until_complete(store.get_file(flow_id, filename))
            .map_err(StoreError::extraction)?;

        let suffix = Path::new(filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("oracle_wallet_")
            .suffix(&suffix)
            .tempfile_in(&self.scratch_dir)
            .map_err(StoreError::extraction)?;
        file.write_all(&content).map_err(StoreError::extraction)?;
        file.flush().map_err(StoreError::extraction)?;

        let temp_path = file.into_temp_path();
        let path = temp_path.to_path_buf();
        info!("Downloaded wallet file from remote storage to: {}", path.display());
        Ok(ResolvedWallet {
            path,
            download: Some(temp_path),
        })
    }
}
