//! Oracle AI Database vector store pipeline with Amazon Bedrock model
//! providers.
//!
//! A build resolves and unpacks the TLS wallet, connects, provisions the
//! vector table and ingests documents; the resulting [`oracle::StoreHandle`]
//! serves similarity, MMR and score-threshold searches.

pub mod bedrock;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod oracle;
pub mod status;
pub mod wallet;

pub use config::Config;
pub use document::{IngestRecord, MetadataValue, SearchResult, StoredRecord};
pub use embeddings::Embeddings;
pub use error::{Result, StoreError};
pub use status::StatusBoard;
