//! In-process doubles for unit tests.

use crate::document::StoredRecord;
use crate::embeddings::Embeddings;
use crate::oracle::schema::TABLE_EXISTS_SQL;
use crate::oracle::session::{Candidate, RowInsert, SqlSession};
use crate::oracle::vector::DistanceStrategy;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Session that records every statement instead of talking to Oracle.
#[derive(Default)]
pub struct RecordingSession {
    table: Mutex<Option<String>>,
    rows: Vec<StoredRecord>,
    candidates: Vec<Candidate>,
    statements: Mutex<Vec<String>>,
    inserted: Mutex<Vec<RowInsert>>,
    insert_calls: AtomicUsize,
    fetch_limits: Mutex<Vec<Option<u32>>>,
    nearest_calls: Mutex<Vec<(usize, bool)>>,
    fail_ddl_at: Option<(usize, String)>,
    fail_insert: Option<String>,
    fail_fetch: Option<String>,
    fail_nearest: Option<String>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str) -> Self {
        *self.table.lock() = Some(name.to_string());
        self
    }

    pub fn with_rows(rows: Vec<(&str, &str, Value)>) -> Self {
        let rows = rows
            .into_iter()
            .map(|(id, text, meta)| {
                StoredRecord::from_columns(id.to_string(), Some(text.to_string()), Some(&meta.to_string()))
            })
            .collect();
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Candidates at the given distances, each with a distinct embedding.
    pub fn with_candidates(mut self, distances: &[f64]) -> Self {
        self.candidates = distances
            .iter()
            .enumerate()
            .map(|(i, &distance)| Candidate {
                record: StoredRecord::from_columns(format!("ID{i}"), Some(format!("doc {i}")), None),
                distance,
                embedding: Some((0..4).map(|j| if j == i % 4 { 1.0 } else { 0.1 }).collect()),
            })
            .collect();
        self
    }

    /// Fail the `index`-th DDL statement (0-based).
    pub fn failing_ddl(mut self, index: usize, message: &str) -> Self {
        self.fail_ddl_at = Some((index, message.to_string()));
        self
    }

    pub fn failing_insert(mut self, message: &str) -> Self {
        self.fail_insert = Some(message.to_string());
        self
    }

    pub fn failing_fetch(mut self, message: &str) -> Self {
        self.fail_fetch = Some(message.to_string());
        self
    }

    pub fn failing_search(mut self, message: &str) -> Self {
        self.fail_nearest = Some(message.to_string());
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    pub fn inserted(&self) -> Vec<RowInsert> {
        self.inserted.lock().clone()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_limits(&self) -> Vec<Option<u32>> {
        self.fetch_limits.lock().clone()
    }

    pub fn nearest_limits(&self) -> Vec<usize> {
        self.nearest_calls.lock().iter().map(|(l, _)| *l).collect()
    }

    pub fn nearest_embedding_flags(&self) -> Vec<bool> {
        self.nearest_calls.lock().iter().map(|(_, e)| *e).collect()
    }
}

impl SqlSession for RecordingSession {
    fn find_table(&self, table_name: &str) -> anyhow::Result<Option<String>> {
        self.statements.lock().push(TABLE_EXISTS_SQL.to_string());
        Ok(self
            .table
            .lock()
            .clone()
            .filter(|t| t.eq_ignore_ascii_case(table_name)))
    }

    fn execute(&self, sql: &str) -> anyhow::Result<()> {
        let mut statements = self.statements.lock();
        let ddl_index = statements.iter().filter(|s| s.starts_with("CREATE") || s.starts_with("ALTER")).count();
        statements.push(sql.to_string());
        if let Some((at, msg)) = &self.fail_ddl_at {
            if *at == ddl_index {
                anyhow::bail!("{msg}");
            }
        }
        if sql.starts_with("CREATE TABLE") {
            let name = sql
                .split_whitespace()
                .nth(2)
                .and_then(|q| q.split('.').nth(1))
                .unwrap_or_default()
                .to_string();
            *self.table.lock() = Some(name);
        }
        Ok(())
    }

    fn commit(&self) -> anyhow::Result<()> {
        self.statements.lock().push("COMMIT".into());
        Ok(())
    }

    fn rollback(&self) -> anyhow::Result<()> {
        self.statements.lock().push("ROLLBACK".into());
        *self.table.lock() = None;
        Ok(())
    }

    fn fetch_rows(&self, _table: &str, limit: Option<u32>) -> anyhow::Result<Vec<StoredRecord>> {
        self.fetch_limits.lock().push(limit);
        if let Some(msg) = &self.fail_fetch {
            anyhow::bail!("{msg}");
        }
        let take = limit.map_or(self.rows.len(), |l| l as usize);
        Ok(self.rows.iter().take(take).cloned().collect())
    }

    fn insert_rows(&self, _table: &str, rows: &[RowInsert]) -> anyhow::Result<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.fail_insert {
            anyhow::bail!("{msg}");
        }
        self.inserted.lock().extend_from_slice(rows);
        Ok(())
    }

    fn nearest(
        &self,
        _table: &str,
        _query: &[f32],
        _strategy: DistanceStrategy,
        limit: usize,
        with_embeddings: bool,
    ) -> anyhow::Result<Vec<Candidate>> {
        self.nearest_calls.lock().push((limit, with_embeddings));
        if let Some(msg) = &self.fail_nearest {
            anyhow::bail!("{msg}");
        }
        Ok(self
            .candidates
            .iter()
            .take(limit)
            .cloned()
            .map(|mut c| {
                if !with_embeddings {
                    c.embedding = None;
                }
                c
            })
            .collect())
    }

    fn ping(&self) -> bool {
        true
    }
}

/// Deterministic embeddings derived from the text bytes.
pub struct HashEmbeddings {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let seed: usize = text.bytes().map(usize::from).sum();
        (0..self.dimension)
            .map(|j| ((seed + j * 7) % 17) as f32 / 17.0 + 0.01)
            .collect()
    }
}

impl Embeddings for HashEmbeddings {
    fn name(&self) -> &str {
        "hash"
    }

    fn embed_documents(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector(text))
    }
}
