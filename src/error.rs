//! Error taxonomy for the vector store pipeline.
//!
//! Wallet, connection and provisioning failures are fatal to a build call.
//! Search failures are downgraded to an empty result at the retrieval
//! boundary, so `Search` only ever surfaces from the lower-level helpers.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by the pipeline errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed reference or missing required input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configured local file or directory does not exist.
    #[error("Wallet file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to extract wallet file: {source}")]
    Extraction {
        #[source]
        source: BoxError,
    },

    #[error("Failed to connect to Oracle Database {dsn}: {source}")]
    Connection {
        dsn: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to create table '{table}': {source}")]
    Provisioning {
        table: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to add documents: {source}")]
    Insert {
        #[source]
        source: BoxError,
    },

    #[error("Search failed: {source}")]
    Search {
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    pub fn extraction(source: impl Into<BoxError>) -> Self {
        Self::Extraction {
            source: source.into(),
        }
    }

    pub fn connection(dsn: &str, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            dsn: dsn.to_string(),
            source: source.into(),
        }
    }

    pub fn provisioning(table: &str, source: impl Into<BoxError>) -> Self {
        Self::Provisioning {
            table: table.to_string(),
            source: source.into(),
        }
    }

    pub fn insert(source: impl Into<BoxError>) -> Self {
        Self::Insert {
            source: source.into(),
        }
    }

    pub fn search(source: impl Into<BoxError>) -> Self {
        Self::Search {
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
