//! Bedrock embedding models (Cohere and Titan families).

use super::client::BedrockRuntimeClient;
use crate::embeddings::Embeddings;
use anyhow::Context;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// Cohere's per-request text limit.
const COHERE_MAX_TEXTS: usize = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelFamily {
    Cohere,
    Titan,
}

impl ModelFamily {
    fn of(model_id: &str) -> anyhow::Result<Self> {
        // Cross-region inference profiles prefix the id with a geography.
        let base = model_id
            .split_once('.')
            .filter(|(prefix, _)| matches!(*prefix, "us" | "eu" | "apac" | "global"))
            .map_or(model_id, |(_, rest)| rest);
        if base.starts_with("cohere.") {
            Ok(Self::Cohere)
        } else if base.starts_with("amazon.titan-embed") {
            Ok(Self::Titan)
        } else {
            anyhow::bail!("Unsupported Bedrock embedding model '{model_id}'")
        }
    }
}

#[derive(Deserialize)]
struct CohereResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct TitanResponse {
    embedding: Vec<f32>,
}

pub struct BedrockEmbeddings {
    client: Arc<BedrockRuntimeClient>,
    model_id: String,
    family: ModelFamily,
}

impl BedrockEmbeddings {
    pub fn new(client: Arc<BedrockRuntimeClient>, model_id: &str) -> anyhow::Result<Self> {
        let family = ModelFamily::of(model_id)?;
        debug!("Created BedrockEmbeddings with model: {model_id}");
        Ok(Self {
            client,
            model_id: model_id.to_string(),
            family,
        })
    }

    fn cohere(&self, texts: &[&str], input_type: &str) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(COHERE_MAX_TEXTS) {
            let body = cohere_body(chunk, input_type);
            let resp: CohereResponse = serde_json::from_value(self.client.invoke_model(&self.model_id, &body)?)
                .context("unexpected Cohere embedding response")?;
            anyhow::ensure!(
                resp.embeddings.len() == chunk.len(),
                "Bedrock returned {} embeddings for {} texts",
                resp.embeddings.len(),
                chunk.len()
            );
            out.extend(resp.embeddings);
        }
        Ok(out)
    }

    fn titan(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let body = titan_body(text);
        let resp: TitanResponse = serde_json::from_value(self.client.invoke_model(&self.model_id, &body)?)
            .context("unexpected Titan embedding response")?;
        Ok(resp.embedding)
    }
}

impl Embeddings for BedrockEmbeddings {
    fn name(&self) -> &str {
        &self.model_id
    }

    fn embed_documents(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match self.family {
            ModelFamily::Cohere => self.cohere(texts, "search_document"),
            ModelFamily::Titan => texts.iter().map(|t| self.titan(t)).collect(),
        }
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        match self.family {
            ModelFamily::Cohere => self
                .cohere(&[text], "search_query")?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("Bedrock returned no embedding")),
            ModelFamily::Titan => self.titan(text),
        }
    }
}

fn cohere_body(texts: &[&str], input_type: &str) -> Value {
    json!({ "texts": texts, "input_type": input_type })
}

fn titan_body(text: &str) -> Value {
    json!({ "inputText": text })
}
