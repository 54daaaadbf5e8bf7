//! Chat through the Bedrock Converse API.

use super::client::BedrockRuntimeClient;
use crate::config::ConverseConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub text: String,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}

pub struct BedrockConverse {
    client: Arc<BedrockRuntimeClient>,
    config: ConverseConfig,
}

impl BedrockConverse {
    pub fn new(client: Arc<BedrockRuntimeClient>, config: ConverseConfig) -> Self {
        debug!("Created ChatBedrockConverse with model: {}", config.model_id);
        Self { client, config }
    }

    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }

    /// The Converse request body for `messages`.
    pub fn request_body(&self, system: Option<&str>, messages: &[ChatMessage]) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": [{ "text": m.text }] }))
            .collect();
        let mut body = json!({
            "messages": messages,
            "inferenceConfig": {
                "maxTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
            },
        });
        if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
            body["system"] = json!([{ "text": system }]);
        }
        let extra = merge_additional_fields(&self.config.additional_model_fields);
        if !extra.is_empty() {
            body["additionalModelRequestFields"] = Value::Object(extra);
        }
        body
    }

    pub fn converse(&self, system: Option<&str>, messages: &[ChatMessage]) -> anyhow::Result<ChatResponse> {
        anyhow::ensure!(!messages.is_empty(), "at least one message is required");
        let body = self.request_body(system, messages);
        let resp = self
            .client
            .converse(&self.config.model_id, &body)
            .map_err(|e| classify_error(&self.config.model_id, &e))?;
        parse_response(&resp)
    }

    /// Single-turn convenience wrapper.
    pub fn ask(&self, prompt: &str) -> anyhow::Result<ChatResponse> {
        self.converse(None, &[ChatMessage::user(prompt)])
    }
}

/// Later maps override earlier ones key by key.
pub fn merge_additional_fields(fields: &[Map<String, Value>]) -> Map<String, Value> {
    let mut merged = Map::new();
    for field in fields {
        merged.extend(field.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// Turn a raw failure into a message that says what probably went wrong.
pub fn classify_error(model_id: &str, error: &anyhow::Error) -> anyhow::Error {
    let details = format!("{error:#}");
    let lower = details.to_lowercase();
    let msg = if lower.contains("validation error") {
        format!(
            "ChatBedrockConverse validation error: {details}. This may be due to incompatible parameters for model '{model_id}'. Consider adjusting the model parameters."
        )
    } else if lower.contains("converse api") {
        format!("Converse API error: {details}. The model '{model_id}' may not support the Converse API.")
    } else {
        format!("Could not complete Bedrock Converse request: {details}")
    };
    warn!("{msg}");
    anyhow::anyhow!(msg)
}

fn parse_response(resp: &Value) -> anyhow::Result<ChatResponse> {
    let content = resp
        .pointer("/output/message/content")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("Converse response has no output message"))?;
    let text = content
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    let usage = resp
        .get("usage")
        .cloned()
        .map(serde_json::from_value)
        .transpose()?
        .unwrap_or_default();
    Ok(ChatResponse {
        text,
        stop_reason: resp.get("stopReason").and_then(Value::as_str).map(String::from),
        usage,
    })
}
