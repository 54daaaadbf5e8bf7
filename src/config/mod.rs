//! Configuration for the vector store pipeline and its model providers.
//!
//! Loaded from a TOML file (default `<config_dir>/oraflow/config.toml`).
//! Every section and field has a default, so a file only needs the
//! settings that differ. Secrets can be overlaid from an [`EnvSnapshot`].

pub mod env;

pub use env::EnvSnapshot;

use crate::oracle::connection::ConnectionProfile;
use crate::oracle::ingest::IngestConfig;
use crate::oracle::retrieve::SearchConfig;
use crate::oracle::schema::{DEFAULT_DIMENSION, TableDescriptor};
use crate::oracle::vector::DistanceStrategy;
use crate::wallet::{BlobStore, HttpBlobStore, StorageMode};
use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub bedrock: BedrockConfig,
}

impl Config {
    /// `<config_dir>/oraflow/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("oraflow").join("config.toml"))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(path, raw).with_context(|| format!("failed to write config {}", path.display()))
    }

    /// Overlay secrets from the environment.
    pub fn apply_env(&mut self, env: &EnvSnapshot) {
        if let Some(pw) = env.get("ORAFLOW_DB_PASSWORD") {
            self.oracle.password = pw.to_string();
        }
        if let Some(pw) = env.get("ORAFLOW_WALLET_PASSWORD") {
            self.oracle.wallet_password = Some(pw.to_string());
        }
    }

    /// JSON Schema of the config file, pretty-printed.
    pub fn json_schema() -> anyhow::Result<String> {
        let schema = schemars::schema_for!(Config);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OracleConfig {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// TNS alias from the wallet (e.g. `mydb_high`), easy-connect string or descriptor.
    #[serde(default)]
    pub dsn: String,
    #[serde(default)]
    pub wallet_password: Option<String>,
}

fn default_user() -> String {
    "ADMIN".into()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            password: String::new(),
            dsn: String::new(),
            wallet_password: None,
        }
    }
}

impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.profile(), f)
    }
}

impl OracleConfig {
    pub fn profile(&self) -> ConnectionProfile {
        ConnectionProfile {
            user: self.user.clone(),
            password: self.password.clone(),
            dsn: self.dsn.clone(),
            wallet_password: self.wallet_password.clone(),
        }
    }
}

/// Where the TLS wallet comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum WalletConfig {
    /// Connect without a wallet (wallet-less TLS or a local database).
    #[default]
    None,
    /// An already-extracted wallet directory. `~` and `$VAR` are expanded.
    Directory { path: String },
    /// A wallet zip: a local path, or `flow_id/filename` in remote storage.
    Archive {
        reference: String,
        #[serde(default)]
        storage: StorageMode,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableConfig {
    #[serde(default = "default_table_name")]
    pub name: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub distance_strategy: DistanceStrategy,
    /// Replace `dimension` with the embedding model's actual output length.
    #[serde(default)]
    pub probe_dimension: bool,
}

fn default_table_name() -> String {
    "PDFCOLLECTION".into()
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: default_table_name(),
            dimension: default_dimension(),
            distance_strategy: DistanceStrategy::default(),
            probe_dimension: false,
        }
    }
}

impl TableConfig {
    pub fn descriptor(&self) -> TableDescriptor {
        TableDescriptor {
            name: self.name.trim().to_string(),
            dimension: self.dimension,
            distance: self.distance_strategy,
        }
    }
}

/// Remote blob storage and scratch space for ephemeral files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StorageConfig {
    /// Base URL serving `GET {base_url}/{flow_id}/{filename}`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where downloaded and extracted wallets land. Defaults to the OS temp dir.
    #[serde(default)]
    pub scratch_dir: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
            scratch_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(std::env::temp_dir)
    }

    /// HTTP blob store when a base URL is configured.
    pub fn blob_store(&self) -> anyhow::Result<Option<Arc<dyn BlobStore>>> {
        let Some(base_url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };
        let store = HttpBlobStore::new(
            base_url,
            self.token.clone(),
            Duration::from_secs(self.timeout_secs),
        )?;
        Ok(Some(Arc::new(store)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BedrockConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Override for the `bedrock-runtime` endpoint.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub credentials: AwsCredentialsConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub converse: ConverseConfig,
}

fn default_region() -> String {
    "us-east-1".into()
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
            credentials: AwsCredentialsConfig::default(),
            embeddings: EmbeddingsConfig::default(),
            converse: ConverseConfig::default(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AwsCredentialsConfig {
    /// Read `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`.
    #[serde(default = "default_true")]
    pub use_env_credentials: bool,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
    /// Profile in the shared credentials file.
    #[serde(default)]
    pub profile: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for AwsCredentialsConfig {
    fn default() -> Self {
        Self {
            use_env_credentials: true,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            profile: None,
        }
    }
}

impl fmt::Debug for AwsCredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("AwsCredentialsConfig")
            .field("use_env_credentials", &self.use_env_credentials)
            .field("access_key_id", &redact(&self.access_key_id))
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("session_token", &redact(&self.session_token))
            .field("profile", &self.profile)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embedding_model")]
    pub model_id: String,
}

fn default_embedding_model() -> String {
    "cohere.embed-multilingual-v3".into()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            model_id: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConverseConfig {
    #[serde(default = "default_chat_model")]
    pub model_id: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Merged in order into `additionalModelRequestFields`.
    #[serde(default)]
    pub additional_model_fields: Vec<Map<String, Value>>,
}

fn default_chat_model() -> String {
    "anthropic.claude-3-5-sonnet-20241022-v2:0".into()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_top_p() -> f64 {
    0.9
}

impl Default for ConverseConfig {
    fn default() -> Self {
        Self {
            model_id: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            additional_model_fields: Vec::new(),
        }
    }
}

/// Expand `~` and `$VAR` / `${VAR}` without touching the filesystem.
pub fn expand_path(input: &str) -> PathBuf {
    let expanded_env = shellexpand::env(input).unwrap_or(std::borrow::Cow::Borrowed(input));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
