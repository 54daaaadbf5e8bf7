//! Database session seam.
//!
//! Everything the pipeline asks of the database goes through
//! [`SqlSession`], so provisioning, ingestion and retrieval can run
//! against an in-process recorder as well as a live Oracle connection.

use crate::document::StoredRecord;
use crate::oracle::ingest::{fetch_rows_sql, insert_sql};
use crate::oracle::retrieve::nearest_sql;
use crate::oracle::schema::TABLE_EXISTS_SQL;
use crate::oracle::vector::{DistanceStrategy, parse_oracle_vector, vec_to_oracle_string};
use oracle::Connection;
use oracle::sql_type::OracleType;
use tracing::debug;

/// A row ready for the batched insert.
#[derive(Debug, Clone, PartialEq)]
pub struct RowInsert {
    pub id: String,
    pub text: String,
    /// JSON object text for the METADATA column.
    pub metadata: String,
    pub embedding: Vec<f32>,
}

/// Nearest-neighbour candidate returned by [`SqlSession::nearest`].
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub record: StoredRecord,
    pub distance: f64,
    /// Present only when the caller asked for embeddings (MMR).
    pub embedding: Option<Vec<f32>>,
}

pub trait SqlSession: Send {
    /// Case-insensitive catalog lookup; returns the stored table name.
    fn find_table(&self, table_name: &str) -> anyhow::Result<Option<String>>;

    /// Execute a statement without binds (DDL).
    fn execute(&self, sql: &str) -> anyhow::Result<()>;

    fn commit(&self) -> anyhow::Result<()>;

    fn rollback(&self) -> anyhow::Result<()>;

    /// `SELECT ID, TEXT, METADATA` with an optional ROWNUM cap.
    fn fetch_rows(&self, table: &str, limit: Option<u32>) -> anyhow::Result<Vec<StoredRecord>>;

    /// One batched insert for all rows, committed on success.
    fn insert_rows(&self, table: &str, rows: &[RowInsert]) -> anyhow::Result<()>;

    /// Up to `limit` rows ordered by ascending distance to `query`.
    fn nearest(
        &self,
        table: &str,
        query: &[f32],
        strategy: DistanceStrategy,
        limit: usize,
        with_embeddings: bool,
    ) -> anyhow::Result<Vec<Candidate>>;

    fn ping(&self) -> bool;
}

/// [`SqlSession`] over a live `oracle` connection.
///
/// The connection is closed when the session is dropped.
pub struct OracleSession {
    conn: Connection,
}

impl OracleSession {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl SqlSession for OracleSession {
    fn find_table(&self, table_name: &str) -> anyhow::Result<Option<String>> {
        match self.conn.query_row_as::<String>(TABLE_EXISTS_SQL, &[&table_name]) {
            Ok(name) => Ok(Some(name)),
            Err(ref e) if e.kind() == oracle::ErrorKind::NoDataFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Table lookup for '{table_name}' failed: {e}")),
        }
    }

    fn execute(&self, sql: &str) -> anyhow::Result<()> {
        self.conn
            .execute(sql, &[])
            .map_err(|e| anyhow::anyhow!("{e}\nSQL: {sql}"))?;
        Ok(())
    }

    fn commit(&self) -> anyhow::Result<()> {
        self.conn.commit()?;
        Ok(())
    }

    fn rollback(&self) -> anyhow::Result<()> {
        self.conn.rollback()?;
        Ok(())
    }

    fn fetch_rows(&self, table: &str, limit: Option<u32>) -> anyhow::Result<Vec<StoredRecord>> {
        let sql = fetch_rows_sql(table, limit.is_some());
        let rows = match limit {
            Some(limit) => self.conn.query(&sql, &[&i64::from(limit)])?,
            None => self.conn.query(&sql, &[])?,
        };

        let mut records = Vec::new();
        for row_result in rows {
            let row = row_result?;
            let id: String = row.get(0)?;
            let text: Option<String> = row.get(1)?;
            let metadata: Option<String> = row.get(2)?;
            records.push(StoredRecord::from_columns(id, text, metadata.as_deref()));
        }
        Ok(records)
    }

    fn insert_rows(&self, table: &str, rows: &[RowInsert]) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let sql = insert_sql(table);
        let mut batch = self.conn.batch(&sql, rows.len()).build()?;
        batch.set_type(2, &OracleType::Varchar2(32767))?;
        batch.set_type(3, &OracleType::CLOB)?;
        batch.set_type(4, &OracleType::CLOB)?;
        for row in rows {
            let vector = vec_to_oracle_string(&row.embedding);
            batch.append_row(&[&row.id, &vector, &row.metadata, &row.text])?;
        }
        batch.execute()?;
        self.conn.commit()?;
        debug!("Inserted {} rows into {table}", rows.len());
        Ok(())
    }

    fn nearest(
        &self,
        table: &str,
        query: &[f32],
        strategy: DistanceStrategy,
        limit: usize,
        with_embeddings: bool,
    ) -> anyhow::Result<Vec<Candidate>> {
        let sql = nearest_sql(table, strategy, with_embeddings);
        let query_vec = vec_to_oracle_string(query);
        let limit_i64 = i64::try_from(limit)?;

        let rows = self.conn.query(&sql, &[&query_vec, &limit_i64])?;
        let mut candidates = Vec::new();
        for row_result in rows {
            let row = row_result?;
            let id: String = row.get(0)?;
            let text: Option<String> = row.get(1)?;
            let metadata: Option<String> = row.get(2)?;
            let distance: f64 = row.get(3)?;
            let embedding = if with_embeddings {
                let raw: String = row.get(4)?;
                Some(parse_oracle_vector(&raw)?)
            } else {
                None
            };
            candidates.push(Candidate {
                record: StoredRecord::from_columns(id, text, metadata.as_deref()),
                distance,
                embedding,
            });
        }
        Ok(candidates)
    }

    fn ping(&self) -> bool {
        self.conn.ping().is_ok()
    }
}
