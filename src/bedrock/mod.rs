//! Amazon Bedrock model providers: embeddings and Converse chat.

pub mod client;
pub mod converse;
pub mod credentials;
pub mod embeddings;
pub mod sigv4;

pub use client::BedrockRuntimeClient;
pub use converse::{BedrockConverse, ChatMessage, ChatResponse};
pub use credentials::{AwsCredentials, CredentialChain, CredentialSource};
pub use embeddings::BedrockEmbeddings;

use crate::config::{BedrockConfig, EnvSnapshot};
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolve credentials and build a runtime client for `config`.
pub fn runtime_client(config: &BedrockConfig, env: &EnvSnapshot) -> anyhow::Result<Arc<BedrockRuntimeClient>> {
    let (_, credentials) = CredentialChain::from_config(&config.credentials, env).resolve()?;
    let client = BedrockRuntimeClient::new(
        &config.region,
        config.endpoint_url.as_deref(),
        credentials,
        REQUEST_TIMEOUT,
    )
    .map_err(|e| anyhow::anyhow!("Failed to create Bedrock client: {e:#}"))?;
    Ok(Arc::new(client))
}

pub fn embeddings(config: &BedrockConfig, env: &EnvSnapshot) -> anyhow::Result<BedrockEmbeddings> {
    BedrockEmbeddings::new(runtime_client(config, env)?, &config.embeddings.model_id)
}

pub fn converse(config: &BedrockConfig, env: &EnvSnapshot) -> anyhow::Result<BedrockConverse> {
    Ok(BedrockConverse::new(runtime_client(config, env)?, config.converse.clone()))
}
