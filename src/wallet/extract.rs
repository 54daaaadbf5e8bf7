//! Unpack a wallet archive into a directory that lives as long as its guard.

use super::resolve::ResolvedWallet;
use crate::error::{Result, StoreError};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Temporary directory holding an extracted wallet.
///
/// The directory and everything in it is removed on drop.
#[derive(Debug)]
pub struct WalletDir {
    dir: TempDir,
}

impl WalletDir {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

pub struct WalletExtractor {
    scratch_dir: PathBuf,
}

impl WalletExtractor {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Unpack `wallet` into a fresh `oracle_wallet_*` directory.
    ///
    /// Consumes the resolved wallet so a downloaded archive is deleted
    /// when this returns, whether extraction worked or not.
    pub fn extract(&self, wallet: ResolvedWallet) -> Result<WalletDir> {
        let dir = tempfile::Builder::new()
            .prefix("oracle_wallet_")
            .tempdir_in(&self.scratch_dir)
            .map_err(StoreError::extraction)?;
        info!("Extracting wallet to temporary directory: {}", dir.path().display());

        // On error `dir` drops here and removes whatever was unpacked.
        unpack(wallet.path(), dir.path()).map_err(StoreError::extraction)?;

        if wallet.is_download() {
            debug!("Removing downloaded wallet archive {}", wallet.path().display());
        }
        info!("Wallet extracted successfully");
        Ok(WalletDir { dir })
    }
}

fn unpack(archive_path: &Path, dest: &Path) -> anyhow::Result<()> {
    let file = File::open(archive_path)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {e}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| anyhow::anyhow!("{} is not a valid wallet archive: {e}", archive_path.display()))?;
    archive.extract(dest)?;
    debug!("Unpacked {} wallet entries", archive.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::resolve::{StorageMode, WalletResolver};
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_wallet_zip(path: &Path) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opts = SimpleFileOptions::default();
        zip.start_file("tnsnames.ora", opts).unwrap();
        zip.write_all(b"db_high = (description=(address=(protocol=tcps)(port=1522)(host=adb.example.com)))")
            .unwrap();
        zip.start_file("cwallet.sso", opts).unwrap();
        zip.write_all(b"\x01\x02").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_into_ephemeral_directory() {
        let work = tempfile::tempdir().unwrap();
        let archive = work.path().join("wallet.zip");
        write_wallet_zip(&archive);
        let scratch = tempfile::tempdir().unwrap();

        let resolved = WalletResolver::new(scratch.path())
            .resolve(archive.to_str().unwrap(), StorageMode::Local)
            .unwrap();
        let wallet_dir = WalletExtractor::new(scratch.path()).extract(resolved).unwrap();

        assert!(wallet_dir.path().join("tnsnames.ora").exists());
        assert!(wallet_dir.path().join("cwallet.sso").exists());
        let name = wallet_dir.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("oracle_wallet_"));

        let path = wallet_dir.path().to_path_buf();
        drop(wallet_dir);
        assert!(!path.exists());
        // The local archive itself is never removed.
        assert!(archive.exists());
    }

    #[test]
    fn corrupt_archive_leaves_nothing_behind() {
        let scratch = tempfile::tempdir().unwrap();
        let mut download = tempfile::Builder::new()
            .suffix(".zip")
            .tempfile_in(scratch.path())
            .unwrap();
        download.write_all(b"definitely not a zip").unwrap();
        let download_path = download.into_temp_path();
        let resolved = ResolvedWallet {
            path: download_path.to_path_buf(),
            download: Some(download_path),
        };

        let err = WalletExtractor::new(scratch.path()).extract(resolved).unwrap_err();
        assert!(matches!(err, StoreError::Extraction { .. }));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
