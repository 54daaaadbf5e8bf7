//! Vector table provisioning.
//!
//! The table is looked up case-insensitively and created only when absent:
//! CREATE TABLE, primary key, vector index, then a single commit. An
//! existing table is accepted as-is; its shape is never checked or altered.

use crate::error::{Result, StoreError};
use crate::oracle::session::SqlSession;
use crate::oracle::vector::DistanceStrategy;
use tracing::{debug, info, warn};

/// Default width of the EMBEDDING column.
pub const DEFAULT_DIMENSION: usize = 1024;

pub const TABLE_EXISTS_SQL: &str =
    "SELECT table_name FROM user_tables WHERE UPPER(table_name) = UPPER(:table_name)";

/// Longest unquoted identifier Oracle accepts (12.2+).
const MAX_IDENTIFIER_BYTES: usize = 128;

pub fn create_table_sql(user: &str, table: &str, dimension: usize) -> String {
    format!(
        "CREATE TABLE {user}.{table} (ID VARCHAR2(100 BYTE), TEXT CLOB, METADATA CLOB, EMBEDDING VECTOR({dimension}, *), CREATED_AT TIMESTAMP(6) DEFAULT CURRENT_TIMESTAMP)"
    )
}

pub fn primary_key_sql(user: &str, table: &str) -> String {
    format!(
        "ALTER TABLE {user}.{table} ADD PRIMARY KEY (ID) USING INDEX PCTFREE 10 INITRANS 20 MAXTRANS 255 TABLESPACE DATA ENABLE"
    )
}

/// The index distance is always COSINE, whatever the table's strategy.
pub fn vector_index_sql(user: &str, table: &str) -> String {
    format!(
        "CREATE VECTOR INDEX {user}.VECTOR_IDX_{table} ON {user}.{table} (EMBEDDING) ORGANIZATION INMEMORY NEIGHBOR GRAPH WITH DISTANCE COSINE WITH TARGET ACCURACY 95"
    )
}

/// Target table shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    pub name: String,
    pub dimension: usize,
    pub distance: DistanceStrategy,
}

/// Reject anything that is not a plain unquoted Oracle identifier.
///
/// Table and user names are spliced into DDL, so this runs before any
/// SQL text is built.
pub fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#'))
        && name.len() <= MAX_IDENTIFIER_BYTES;
    if valid {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "Invalid {kind} '{name}': expected a letter followed by letters, digits, _, $ or #"
        )))
    }
}

/// Ensure `table` exists in `user`'s schema and return its canonical name.
///
/// Returns the catalog casing for an existing table, or the configured
/// name for one created here.
pub fn ensure_table(session: &dyn SqlSession, user: &str, table: &TableDescriptor) -> Result<String> {
    validate_identifier("table name", &table.name)?;
    validate_identifier("database user", user)?;
    if table.dimension == 0 {
        return Err(StoreError::Validation(
            "Embedding dimension must be greater than zero".into(),
        ));
    }

    let existing = session
        .find_table(&table.name)
        .map_err(|e| StoreError::provisioning(&table.name, e))?;
    if let Some(name) = existing {
        info!("Found existing table: {name}");
        return Ok(name);
    }

    info!("Table '{}' does not exist. Creating table...", table.name);
    if table.distance != DistanceStrategy::Cosine {
        warn!(
            "Vector index on '{}' is created WITH DISTANCE COSINE; configured strategy {} is not applied to the index",
            table.name, table.distance
        );
    }

    let statements = [
        ("table", create_table_sql(user, &table.name, table.dimension)),
        ("primary key", primary_key_sql(user, &table.name)),
        ("vector index", vector_index_sql(user, &table.name)),
    ];
    let created = statements.iter().try_for_each(|(what, sql)| {
        session.execute(sql)?;
        debug!("Created {what} for '{}'", table.name);
        Ok::<_, anyhow::Error>(())
    });

    if let Err(e) = created.and_then(|()| session.commit()) {
        if let Err(rb) = session.rollback() {
            warn!("Rollback after failed provisioning of '{}' failed: {rb}", table.name);
        }
        return Err(StoreError::provisioning(&table.name, e));
    }

    info!("Table '{}' created with primary key and vector index", table.name);
    Ok(table.name.clone())
}
