//! Documents flowing into and out of the vector store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Metadata value supplied by an upstream pipeline stage.
///
/// Only `Json` survives serialization untouched; everything else is
/// stored as its string representation.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Json(Value),
    /// May be NaN or infinite, which JSON cannot carry.
    Float(f64),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(Value::String(s)) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            Self::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
        }
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Replace every value JSON cannot represent with its string form.
///
/// Keys and representable values are preserved as-is.
pub fn sanitize_metadata(metadata: &Metadata) -> Map<String, Value> {
    metadata
        .iter()
        .map(|(key, value)| {
            let clean = match value {
                MetadataValue::Json(v) => v.clone(),
                MetadataValue::Float(x) => serde_json::Number::from_f64(*x)
                    .map_or_else(|| Value::String(value.to_string()), Value::Number),
                other => Value::String(other.to_string()),
            };
            (key.clone(), clean)
        })
        .collect()
}

/// A document not yet written to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestRecord {
    pub text: String,
    pub metadata: Metadata,
}

impl IngestRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Build from a JSON line of the shape `{"text": ..., "metadata": {...}}`.
    pub fn from_json(value: Value) -> anyhow::Result<Self> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            other => anyhow::bail!("Ingest record must be a JSON object, got {other}"),
        };
        let text = match obj.remove("text") {
            Some(Value::String(text)) => text,
            _ => anyhow::bail!("Ingest record is missing a string 'text' field"),
        };
        let metadata = match obj.remove("metadata") {
            Some(Value::Object(meta)) => meta
                .into_iter()
                .map(|(k, v)| (k, MetadataValue::Json(v)))
                .collect(),
            Some(Value::Null) | None => Metadata::new(),
            Some(other) => anyhow::bail!("Ingest record 'metadata' must be an object, got {other}"),
        };
        Ok(Self { text, metadata })
    }
}

/// Stored row with its ID stripped, used for duplicate detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContent {
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// A row read back from the vector table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl StoredRecord {
    /// Parse the METADATA column; unparseable or non-object JSON reads as empty.
    pub fn from_columns(id: String, text: Option<String>, metadata_json: Option<&str>) -> Self {
        let metadata = metadata_json
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .and_then(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        Self {
            id,
            text: text.unwrap_or_default(),
            metadata,
        }
    }

    pub fn without_id(self) -> DocumentContent {
        DocumentContent {
            text: self.text,
            metadata: self.metadata,
        }
    }
}

/// One retrieval hit, most relevant first in a result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    /// Relevance in the store's distance strategy (higher is closer).
    pub score: f64,
}

/// Derive the stored primary key for a document.
///
/// A string `id` in the metadata seeds the key, otherwise a random UUID.
/// The key is the first 16 hex digits (upper-case) of the seed's SHA-256.
pub fn document_id(metadata: &Map<String, Value>) -> String {
    let seed = match metadata.get("id") {
        Some(Value::String(id)) => id.clone(),
        _ => uuid::Uuid::new_v4().to_string(),
    };
    let digest = Sha256::digest(seed.as_bytes());
    hex::encode_upper(digest)[..16].to_string()
}
