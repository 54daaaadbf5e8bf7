//! Document ingestion with optional duplicate suppression.

use crate::document::{DocumentContent, IngestRecord, document_id, sanitize_metadata};
use crate::embeddings::Embeddings;
use crate::error::{Result, StoreError};
use crate::oracle::session::{RowInsert, SqlSession};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub fn fetch_rows_sql(table: &str, limited: bool) -> String {
    if limited {
        format!("SELECT ID, TEXT, METADATA FROM {table} WHERE ROWNUM <= :limit")
    } else {
        format!("SELECT ID, TEXT, METADATA FROM {table}")
    }
}

pub fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (ID, EMBEDDING, METADATA, TEXT) VALUES (:1, TO_VECTOR(:2), :3, :4)")
}

/// Duplicate policy for a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IngestConfig {
    /// Insert every record even when an identical one is already stored.
    #[serde(default)]
    pub allow_duplicates: bool,

    /// Cap on stored rows scanned for duplicates (also caps row listings).
    /// Zero or absent means unbounded.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl IngestConfig {
    pub fn effective_limit(&self) -> Option<u32> {
        self.limit.filter(|&l| l > 0)
    }
}

/// Sanitise incoming records and drop those whose `(text, metadata)`
/// already appears in `existing`.
///
/// Quadratic in the two list sizes; intended for small catalogs.
pub fn select_new_documents(records: &[IngestRecord], existing: &[DocumentContent]) -> Vec<DocumentContent> {
    records
        .iter()
        .map(|record| DocumentContent {
            text: record.text.clone(),
            metadata: sanitize_metadata(&record.metadata),
        })
        .filter(|doc| !existing.contains(doc))
        .collect()
}

/// Stored rows with IDs stripped, for comparison. Read errors are
/// logged and treated as an empty table.
fn existing_documents(session: &dyn SqlSession, table: &str, limit: Option<u32>) -> Vec<DocumentContent> {
    match session.fetch_rows(table, limit) {
        Ok(rows) => rows.into_iter().map(|r| r.without_id()).collect(),
        Err(e) => {
            warn!("Failed to fetch data from Oracle table: {e}");
            Vec::new()
        }
    }
}

/// Insert the records that are not already stored.
///
/// Returns how many rows were written. Nothing is written (and this is not
/// an error) when there is no embedding model or no new record.
pub fn add_records(
    session: &dyn SqlSession,
    embeddings: Option<&dyn Embeddings>,
    table: &str,
    records: &[IngestRecord],
    config: &IngestConfig,
) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let existing = if config.allow_duplicates {
        Vec::new()
    } else {
        existing_documents(session, table, config.effective_limit())
    };
    let documents = select_new_documents(records, &existing);
    let skipped = records.len() - documents.len();
    if skipped > 0 {
        info!("Skipping {skipped} documents already present in {table}");
    }

    let Some(model) = embeddings.filter(|_| !documents.is_empty()) else {
        info!("No documents to add to the Vector Store.");
        return Ok(0);
    };

    info!("Adding {} documents to the Vector Store.", documents.len());
    let rows = embed_rows(model, documents).map_err(|e| {
        warn!("Failed to embed documents: {e}");
        StoreError::insert(e)
    })?;
    session.insert_rows(table, &rows).map_err(|e| {
        warn!("Failed to add documents: {e}");
        StoreError::insert(e)
    })?;
    Ok(rows.len())
}

fn embed_rows(model: &dyn Embeddings, documents: Vec<DocumentContent>) -> anyhow::Result<Vec<RowInsert>> {
    let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
    let vectors = model.embed_documents(&texts)?;
    anyhow::ensure!(
        vectors.len() == documents.len(),
        "embedding model '{}' returned {} vectors for {} documents",
        model.name(),
        vectors.len(),
        documents.len()
    );

    documents
        .into_iter()
        .zip(vectors)
        .map(|(doc, embedding)| {
            Ok(RowInsert {
                id: document_id(&doc.metadata),
                metadata: serde_json::to_string(&doc.metadata)?,
                text: doc.text,
                embedding,
            })
        })
        .collect()
}
