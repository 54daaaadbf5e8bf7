//! Similarity search over the vector table.

use crate::document::SearchResult;
use crate::embeddings::Embeddings;
use crate::oracle::mmr::maximal_marginal_relevance;
use crate::oracle::session::{Candidate, SqlSession};
use crate::oracle::vector::DistanceStrategy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub fn nearest_sql(table: &str, strategy: DistanceStrategy, with_embeddings: bool) -> String {
    let metric = strategy.sql_metric();
    let embedding_col = if with_embeddings {
        ", FROM_VECTOR(EMBEDDING RETURNING CLOB) AS EMBEDDING_TEXT"
    } else {
        ""
    };
    format!(
        "SELECT ID, TEXT, METADATA, VECTOR_DISTANCE(EMBEDDING, TO_VECTOR(:1), {metric}) AS DISTANCE{embedding_col} FROM {table} ORDER BY DISTANCE FETCH APPROX FIRST :2 ROWS ONLY"
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    #[serde(alias = "Similarity")]
    Similarity,
    #[serde(alias = "MMR")]
    Mmr,
    SimilarityScoreThreshold,
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Similarity => "similarity",
            Self::Mmr => "mmr",
            Self::SimilarityScoreThreshold => "similarity_score_threshold",
        })
    }
}

impl FromStr for SearchType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "similarity" => Ok(Self::Similarity),
            "mmr" => Ok(Self::Mmr),
            "similarity_score_threshold" => Ok(Self::SimilarityScoreThreshold),
            other => anyhow::bail!(
                "Unknown search type '{other}' (expected similarity, mmr or similarity_score_threshold)"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchConfig {
    #[serde(default)]
    pub search_type: SearchType,

    /// Results to return; values below 1 are treated as 1.
    #[serde(default = "default_k")]
    pub k: i64,

    /// Candidate pool size before ranking; 0 or absent means `k`.
    #[serde(default = "default_fetch_k")]
    pub fetch_k: Option<u32>,

    /// Minimum relevance for `similarity_score_threshold`.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Relevance/diversity balance for `mmr`, in [0, 1].
    #[serde(default = "default_mmr_lambda")]
    pub mmr_lambda: f64,
}

fn default_k() -> i64 {
    5
}

fn default_fetch_k() -> Option<u32> {
    Some(20)
}

fn default_score_threshold() -> f64 {
    0.35
}

fn default_mmr_lambda() -> f64 {
    0.5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_type: SearchType::default(),
            k: default_k(),
            fetch_k: default_fetch_k(),
            score_threshold: default_score_threshold(),
            mmr_lambda: default_mmr_lambda(),
        }
    }
}

impl SearchConfig {
    pub fn effective_k(&self) -> usize {
        usize::try_from(self.k.max(1)).unwrap_or(usize::MAX)
    }

    /// Rows pulled from the database before ranking.
    pub fn pool_size(&self) -> usize {
        let fetch_k = self.fetch_k.filter(|&f| f > 0).map_or(0, |f| f as usize);
        self.effective_k().max(fetch_k)
    }
}

fn to_result(candidate: Candidate, strategy: DistanceStrategy) -> SearchResult {
    SearchResult {
        score: strategy.relevance_score(candidate.distance),
        id: candidate.record.id,
        text: candidate.record.text,
        metadata: candidate.record.metadata,
    }
}

/// Run one search. `query` must already be trimmed and non-empty.
pub fn run_search(
    session: &dyn SqlSession,
    embeddings: &dyn Embeddings,
    table: &str,
    strategy: DistanceStrategy,
    query: &str,
    config: &SearchConfig,
) -> anyhow::Result<Vec<SearchResult>> {
    let k = config.effective_k();
    let pool = config.pool_size();
    let query_vec = embeddings.embed_query(query)?;
    debug!("Search '{}' k={k} pool={pool} on {table}", config.search_type);

    let results = match config.search_type {
        SearchType::Similarity => session
            .nearest(table, &query_vec, strategy, pool, false)?
            .into_iter()
            .take(k)
            .map(|c| to_result(c, strategy))
            .collect(),
        SearchType::SimilarityScoreThreshold => session
            .nearest(table, &query_vec, strategy, pool, false)?
            .into_iter()
            .map(|c| to_result(c, strategy))
            .filter(|r| r.score >= config.score_threshold)
            .take(k)
            .collect(),
        SearchType::Mmr => {
            let mut candidates = session.nearest(table, &query_vec, strategy, pool, true)?;
            let vectors = candidates
                .iter_mut()
                .map(|c| {
                    c.embedding
                        .take()
                        .ok_or_else(|| anyhow::anyhow!("candidate {} has no embedding", c.record.id))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let picked = maximal_marginal_relevance(&query_vec, &vectors, config.mmr_lambda, k);
            let mut slots: Vec<Option<Candidate>> = candidates.into_iter().map(Some).collect();
            picked
                .into_iter()
                .filter_map(|i| slots[i].take())
                .map(|c| to_result(c, strategy))
                .collect()
        }
    };
    Ok(results)
}
