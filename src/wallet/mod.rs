//! Oracle wallet handling: resolve an archive, unpack it, point the
//! connect descriptor at it.

pub mod blob;
pub mod extract;
pub mod resolve;
pub mod tns;

pub use blob::{BlobStore, HttpBlobStore};
pub use extract::{WalletDir, WalletExtractor};
pub use resolve::{ResolvedWallet, StorageMode, WalletResolver, parse_storage_path};

use crate::error::{Result, StoreError};
use std::path::{Path, PathBuf};

/// Wallet directory handed to the connection.
#[derive(Debug)]
pub enum WalletLocation {
    /// Extracted for this build; removed when dropped.
    Extracted(WalletDir),
    /// An operator-managed directory that is left alone.
    Directory(PathBuf),
}

impl WalletLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Extracted(dir) => dir.path(),
            Self::Directory(path) => path,
        }
    }

    /// Use an existing, already-extracted wallet directory.
    pub fn existing(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(StoreError::NotFound(path));
        }
        Ok(Self::Directory(path))
    }

    /// Whether the directory holds an auto-login wallet the thick client can open.
    pub fn has_auto_login(&self) -> bool {
        self.path().join("cwallet.sso").exists()
    }
}
