//! Oracle AI Vector Search helpers.
//!
//! Conversion between Rust vectors and Oracle's vector text format, the
//! configured distance strategy, and distance-to-relevance scoring.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Metric used to compare embeddings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum DistanceStrategy {
    #[default]
    #[serde(rename = "COSINE")]
    Cosine,
    #[serde(rename = "EUCLIDEAN_DISTANCE")]
    EuclideanDistance,
    #[serde(rename = "DOT_PRODUCT")]
    DotProduct,
}

impl DistanceStrategy {
    /// Metric keyword accepted by `VECTOR_DISTANCE`.
    pub fn sql_metric(self) -> &'static str {
        match self {
            Self::Cosine => "COSINE",
            Self::EuclideanDistance => "EUCLIDEAN",
            Self::DotProduct => "DOT",
        }
    }

    /// Map a raw distance onto a relevance score (higher is closer).
    ///
    /// * cosine: `1 - d`
    /// * euclidean: `1 - d / sqrt(2)` (unit-normalised embeddings)
    /// * dot: Oracle returns the negated inner product, so `-d`,
    ///   or `1 - d` for positive distances
    pub fn relevance_score(self, distance: f64) -> f64 {
        match self {
            Self::Cosine => 1.0 - distance,
            Self::EuclideanDistance => 1.0 - distance / std::f64::consts::SQRT_2,
            Self::DotProduct => {
                if distance > 0.0 {
                    1.0 - distance
                } else {
                    -distance
                }
            }
        }
    }
}

impl fmt::Display for DistanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cosine => "COSINE",
            Self::EuclideanDistance => "EUCLIDEAN_DISTANCE",
            Self::DotProduct => "DOT_PRODUCT",
        })
    }
}

impl FromStr for DistanceStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COSINE" => Ok(Self::Cosine),
            "EUCLIDEAN_DISTANCE" | "EUCLIDEAN" => Ok(Self::EuclideanDistance),
            "DOT_PRODUCT" | "DOT" => Ok(Self::DotProduct),
            other => anyhow::bail!(
                "Unknown distance strategy '{other}' (expected COSINE, EUCLIDEAN_DISTANCE or DOT_PRODUCT)"
            ),
        }
    }
}

/// Convert a `&[f32]` slice into Oracle's `TO_VECTOR()` compatible string.
///
/// Output format: `[0.1,0.2,-0.3]`
pub fn vec_to_oracle_string(v: &[f32]) -> String {
    let mut buf = String::with_capacity(v.len() * 10 + 2);
    buf.push('[');
    for (i, val) in v.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        // Display gives the shortest string that round-trips the f32
        let _ = write!(buf, "{val}");
    }
    buf.push(']');
    buf
}

/// Parse Oracle's vector text `[0.1, 0.2, ...]` into `Vec<f32>`.
pub fn parse_oracle_vector(s: &str) -> anyhow::Result<Vec<f32>> {
    let trimmed = s.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| anyhow::anyhow!("Invalid vector format (missing brackets): {trimmed}"))?;

    if inner.trim().is_empty() {
        anyhow::bail!("Parsed vector is empty");
    }

    inner
        .split(',')
        .map(|tok| {
            tok.trim()
                .parse::<f32>()
                .map_err(|e| anyhow::anyhow!("Failed to parse vector element '{tok}': {e}"))
        })
        .collect()
}
