//! Build a vector store and search it.
//!
//! [`build_store`] runs the whole pipeline: resolve and unpack the wallet,
//! connect, optionally probe the embedding width, provision the table and
//! ingest. The returned [`StoreHandle`] owns the session and the wallet
//! directory; dropping it closes the one and deletes the other.

use crate::config::{Config, WalletConfig, expand_path};
use crate::document::{IngestRecord, SearchResult, StoredRecord};
use crate::embeddings::{Embeddings, probe_dimension};
use crate::error::{Result, StoreError};
use crate::oracle::connection::SessionConnector;
use crate::oracle::ingest::add_records;
use crate::oracle::retrieve::{SearchConfig, run_search};
use crate::oracle::schema::ensure_table;
use crate::oracle::session::SqlSession;
use crate::oracle::vector::DistanceStrategy;
use crate::status::StatusBoard;
use crate::wallet::{BlobStore, StorageMode, WalletExtractor, WalletLocation, WalletResolver};
use std::sync::Arc;
use tracing::{info, warn};

/// Collaborators injected into a build.
pub struct StoreDeps {
    pub connector: Arc<dyn SessionConnector>,
    pub embeddings: Option<Arc<dyn Embeddings>>,
    pub blob_store: Option<Arc<dyn BlobStore>>,
    pub status: StatusBoard,
}

/// An open, provisioned vector table.
pub struct StoreHandle {
    // Field order matters: the session closes before the wallet dir is removed.
    session: Box<dyn SqlSession>,
    table: String,
    distance: DistanceStrategy,
    embeddings: Option<Arc<dyn Embeddings>>,
    status: StatusBoard,
    ingested: usize,
    row_limit: Option<u32>,
    wallet: Option<WalletLocation>,
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("table", &self.table)
            .field("distance", &self.distance)
            .field("ingested", &self.ingested)
            .field("wallet", &self.wallet)
            .finish_non_exhaustive()
    }
}

impl StoreHandle {
    /// Canonical table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn distance(&self) -> DistanceStrategy {
        self.distance
    }

    /// Rows written by the build that produced this handle.
    pub fn ingested(&self) -> usize {
        self.ingested
    }

    pub fn wallet_dir(&self) -> Option<&std::path::Path> {
        self.wallet.as_ref().map(WalletLocation::path)
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Search the table. Never fails: problems are logged, written to the
    /// status board and reported as no results.
    pub fn search(&self, query: &str, config: &SearchConfig) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let Some(embeddings) = self.embeddings.as_deref() else {
            warn!("Search on '{}' skipped: no embedding model configured", self.table);
            self.status.set("Search skipped: no embedding model configured");
            return Vec::new();
        };

        match run_search(
            self.session.as_ref(),
            embeddings,
            &self.table,
            self.distance,
            query,
            config,
        ) {
            Ok(results) => {
                self.status.set(format!("Found {} results", results.len()));
                results
            }
            Err(e) => {
                let err = StoreError::search(e);
                warn!("{err}");
                self.status.set(err.to_string());
                Vec::new()
            }
        }
    }

    /// Stored rows, capped by `limit` or the build's scan limit.
    ///
    /// A failed read is a query failure like any search, so it surfaces as
    /// [`StoreError::Search`] and is written to the status board.
    pub fn rows(&self, limit: Option<u32>) -> Result<Vec<StoredRecord>> {
        let limit = limit.filter(|&l| l > 0).or(self.row_limit);
        match self.session.fetch_rows(&self.table, limit) {
            Ok(rows) => {
                self.status.set(format!("Listed {} rows from {}", rows.len(), self.table));
                Ok(rows)
            }
            Err(e) => {
                let err = StoreError::search(anyhow::anyhow!("failed to list rows of {}: {e:#}", self.table));
                warn!("{err}");
                self.status.set(err.to_string());
                Err(err)
            }
        }
    }

    pub fn ping(&self) -> bool {
        self.session.ping()
    }
}

/// Free-function form of [`StoreHandle::search`].
pub fn search(handle: &StoreHandle, query: &str, config: &SearchConfig) -> Vec<SearchResult> {
    handle.search(query, config)
}

/// Run the full build pipeline and return a ready handle.
///
/// Every exit path writes the status board. On failure, the downloaded
/// archive and the extracted wallet directory are gone before the error
/// is returned.
pub fn build_store(config: &Config, records: &[IngestRecord], deps: &StoreDeps) -> Result<StoreHandle> {
    let built = build_inner(config, records, deps);
    match &built {
        Ok(handle) if handle.ingested > 0 => deps.status.set(format!(
            "Added {} documents to {}",
            handle.ingested, handle.table
        )),
        Ok(handle) => deps
            .status
            .set(format!("No documents to add. Using table {}", handle.table)),
        Err(e) => {
            warn!("Vector store build failed: {e}");
            deps.status.set(e.to_string());
        }
    }
    built
}

fn build_inner(config: &Config, records: &[IngestRecord], deps: &StoreDeps) -> Result<StoreHandle> {
    let profile = config.oracle.profile();
    for (field, value) in [("user", &profile.user), ("password", &profile.password), ("dsn", &profile.dsn)] {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!("Oracle {field} is required")));
        }
    }
    let mut table = config.table.descriptor();

    let wallet = open_wallet(config, deps)?;

    let session = deps
        .connector
        .connect(&profile, wallet.as_ref())
        .map_err(|e| StoreError::connection(&profile.dsn, e))?;
    info!("Successfully connected to Oracle Database");

    let embeddings = deps.embeddings.clone();
    if config.table.probe_dimension {
        if let Some(model) = embeddings.as_deref() {
            let detected = probe_dimension(model).map_err(|e| {
                StoreError::provisioning(&table.name, e.context("embedding dimension probe failed"))
            })?;
            if detected != table.dimension {
                info!(
                    "Embedding model '{}' produces {detected} dimensions; overriding configured {}",
                    model.name(),
                    table.dimension
                );
                table.dimension = detected;
            }
        } else {
            warn!("probe_dimension is set but no embedding model is configured");
        }
    }

    let name = ensure_table(session.as_ref(), &profile.user, &table)?;
    let ingested = add_records(
        session.as_ref(),
        embeddings.as_deref(),
        &name,
        records,
        &config.ingest,
    )?;

    Ok(StoreHandle {
        session,
        table: name,
        distance: table.distance,
        embeddings,
        status: deps.status.clone(),
        ingested,
        row_limit: config.ingest.effective_limit(),
        wallet,
    })
}

fn open_wallet(config: &Config, deps: &StoreDeps) -> Result<Option<WalletLocation>> {
    match &config.wallet {
        WalletConfig::None => Ok(None),
        WalletConfig::Directory { path } => WalletLocation::existing(expand_path(path)).map(Some),
        WalletConfig::Archive { reference, storage } => {
            let scratch = config.storage.scratch_dir();
            let mut resolver = WalletResolver::new(&scratch);
            if let Some(store) = &deps.blob_store {
                resolver = resolver.with_blob_store(Arc::clone(store));
            }
            let reference = match storage {
                StorageMode::Local => expand_path(reference).to_string_lossy().into_owned(),
                StorageMode::Remote => reference.clone(),
            };
            let resolved = resolver.resolve(&reference, *storage)?;
            let dir = WalletExtractor::new(&scratch).extract(resolved)?;
            Ok(Some(WalletLocation::Extracted(dir)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::connection::ConnectionProfile;
    use crate::oracle::testing::{HashEmbeddings, RecordingSession};
    use parking_lot::Mutex;

    /// Hands out one prepared session.
    struct OneShot(Mutex<Option<RecordingSession>>);

    impl SessionConnector for OneShot {
        fn connect(
            &self,
            _profile: &ConnectionProfile,
            _wallet: Option<&WalletLocation>,
        ) -> anyhow::Result<Box<dyn SqlSession>> {
            let session = self
                .0
                .lock()
                .take()
                .ok_or_else(|| anyhow::anyhow!("ORA-12541: no listener"))?;
            Ok(Box::new(session))
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.oracle.password = "pw".into();
        config.oracle.dsn = "mydb_high".into();
        config
    }

    fn deps(session: Option<RecordingSession>) -> StoreDeps {
        StoreDeps {
            connector: Arc::new(OneShot(Mutex::new(session))),
            embeddings: Some(Arc::new(HashEmbeddings::new(4))),
            blob_store: None,
            status: StatusBoard::new(),
        }
    }

    #[test]
    fn missing_dsn_is_a_validation_error() {
        let mut cfg = config();
        cfg.oracle.dsn = " ".into();
        let deps = deps(Some(RecordingSession::new()));
        let err = build_store(&cfg, &[], &deps).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(deps.status.get(), Some(err.to_string()));
    }

    #[test]
    fn connection_failure_carries_the_dsn() {
        let deps = deps(None);
        let err = build_store(&config(), &[], &deps).unwrap_err();
        match &err {
            StoreError::Connection { dsn, .. } => assert_eq!(dsn, "mydb_high"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(deps.status.get().unwrap().contains("ORA-12541"));
    }

    #[test]
    fn probe_overrides_configured_dimension() {
        let mut cfg = config();
        cfg.table.probe_dimension = true;
        let deps = deps(Some(RecordingSession::new()));
        let handle = build_store(&cfg, &[], &deps).unwrap();
        assert_eq!(handle.table(), "PDFCOLLECTION");
        assert!(handle.ping());
        assert_eq!(deps.status.get().as_deref(), Some("No documents to add. Using table PDFCOLLECTION"));
    }

    #[test]
    fn blank_query_returns_nothing() {
        let deps = deps(Some(RecordingSession::new().with_candidates(&[0.1])));
        let handle = build_store(&config(), &[], &deps).unwrap();
        assert!(handle.search("   ", &SearchConfig::default()).is_empty());
        assert_eq!(handle.search("hello", &SearchConfig::default()).len(), 1);
    }

    #[test]
    fn search_errors_become_empty_results() {
        let deps = deps(Some(RecordingSession::new().failing_search("ORA-51805: bad vector")));
        let handle = build_store(&config(), &[], &deps).unwrap();
        assert!(search(&handle, "hello", &SearchConfig::default()).is_empty());
        assert!(deps.status.get().unwrap().contains("ORA-51805"));
    }

    #[test]
    fn row_listing_failures_reach_the_status_board() {
        let deps = deps(Some(RecordingSession::new().failing_fetch("ORA-00942: table or view does not exist")));
        let handle = build_store(&config(), &[], &deps).unwrap();
        let err = handle.rows(Some(10)).unwrap_err();
        assert!(matches!(err, StoreError::Search { .. }));
        let status = deps.status.get().unwrap();
        assert!(status.contains("ORA-00942"), "{status}");
        assert!(status.contains("PDFCOLLECTION"), "{status}");
    }

    #[test]
    fn row_listing_reports_count() {
        let session = RecordingSession::with_rows(vec![("A1", "alpha", serde_json::json!({}))]);
        let deps = deps(Some(session));
        let handle = build_store(&config(), &[], &deps).unwrap();
        assert_eq!(handle.rows(None).unwrap().len(), 1);
        assert_eq!(deps.status.get().as_deref(), Some("Listed 1 rows from PDFCOLLECTION"));
    }
}
