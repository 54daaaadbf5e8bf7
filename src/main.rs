//! `oraflow` command line.
//!
//! # Commands
//!
//! - `provision`: connect and make sure the vector table exists
//! - `ingest`: add JSON-lines documents to the table
//! - `search`: query the table
//! - `rows`: list stored rows
//! - `embed`: embed one text with the configured Bedrock model
//! - `chat`: send one prompt through Bedrock Converse
//! - `schema`: print the config file's JSON Schema

use anyhow::Context;
use clap::{Parser, Subcommand};
use oraflow::config::{Config, EnvSnapshot};
use oraflow::embeddings::Embeddings;
use oraflow::oracle::{OracleConnector, SearchConfig, SearchType, StoreDeps, StoreHandle, build_store};
use oraflow::{IngestRecord, StatusBoard, bedrock};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "oraflow", version, about = "Oracle AI Database vector store with Bedrock models")]
#[command(propagate_version = true)]
struct Cli {
    /// Config file (default: <config_dir>/oraflow/config.toml)
    #[arg(short, long, env = "ORAFLOW_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and make sure the vector table exists
    Provision,
    /// Add documents from a JSON-lines file (`{"text": ..., "metadata": {...}}`)
    Ingest {
        path: PathBuf,
        /// Insert even when an identical document is already stored
        #[arg(long)]
        allow_duplicates: bool,
    },
    /// Search the vector table
    Search {
        query: String,
        #[arg(short, long)]
        k: Option<i64>,
        /// similarity, mmr or similarity_score_threshold
        #[arg(long)]
        search_type: Option<SearchType>,
        #[arg(long)]
        fetch_k: Option<u32>,
        #[arg(long)]
        score_threshold: Option<f64>,
        #[arg(long)]
        mmr_lambda: Option<f64>,
    },
    /// List stored rows
    Rows {
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Embed one text with the configured Bedrock embedding model
    Embed { text: String },
    /// Send one prompt through Bedrock Converse
    Chat {
        prompt: String,
        #[arg(long)]
        system: Option<String>,
    },
    /// Print the JSON Schema of the config file
    Schema,
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let env = EnvSnapshot::capture();
    let config_path = cli.config;
    let load = || load_config(config_path.as_deref(), &env);

    match cli.command {
        Commands::Schema => println!("{}", Config::json_schema()?),
        Commands::Provision => {
            let config = load()?;
            let handle = open_store(&config, &env, &[], false)?;
            println!("{}", handle.table());
        }
        Commands::Ingest {
            path,
            allow_duplicates,
        } => {
            let records = read_records(&path)?;
            let mut config = load()?;
            config.ingest.allow_duplicates |= allow_duplicates;
            let handle = open_store(&config, &env, &records, true)?;
            println!("{} of {} documents added to {}", handle.ingested(), records.len(), handle.table());
        }
        Commands::Search {
            query,
            k,
            search_type,
            fetch_k,
            score_threshold,
            mmr_lambda,
        } => {
            let config = load()?;
            let search = SearchConfig {
                search_type: search_type.unwrap_or(config.search.search_type),
                k: k.unwrap_or(config.search.k),
                fetch_k: fetch_k.or(config.search.fetch_k),
                score_threshold: score_threshold.unwrap_or(config.search.score_threshold),
                mmr_lambda: mmr_lambda.unwrap_or(config.search.mmr_lambda),
            };
            let handle = open_store(&config, &env, &[], true)?;
            let results = handle.search(&query, &search);
            if results.is_empty() {
                if let Some(status) = handle.status().get() {
                    info!("{status}");
                }
            }
            for result in results {
                println!("{}", serde_json::to_string(&result)?);
            }
        }
        Commands::Rows { limit } => {
            let config = load()?;
            let handle = open_store(&config, &env, &[], false)?;
            for row in handle.rows(limit)? {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        Commands::Embed { text } => {
            let config = load()?;
            let model = bedrock::embeddings(&config.bedrock, &env)?;
            let vector = model.embed_query(&text)?;
            println!("{}", serde_json::to_string(&vector)?);
            info!("{} dimensions from {}", vector.len(), model.name());
        }
        Commands::Chat { prompt, system } => {
            let config = load()?;
            let chat = bedrock::converse(&config.bedrock, &env)?;
            let reply = chat.converse(system.as_deref(), &[bedrock::ChatMessage::user(prompt)])?;
            println!("{}", reply.text);
            info!(
                "{} input / {} output tokens ({})",
                reply.usage.input_tokens,
                reply.usage.output_tokens,
                reply.stop_reason.as_deref().unwrap_or("no stop reason")
            );
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>, env: &EnvSnapshot) -> anyhow::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path().context("no config directory on this platform; pass --config")?,
    };
    let mut config = Config::load_or_default(&path)?;
    config.apply_env(env);
    Ok(config)
}

/// Build a store, with Bedrock embeddings when `with_embeddings` is set.
fn open_store(
    config: &Config,
    env: &EnvSnapshot,
    records: &[IngestRecord],
    with_embeddings: bool,
) -> anyhow::Result<StoreHandle> {
    let embeddings: Option<Arc<dyn Embeddings>> = if with_embeddings || config.table.probe_dimension {
        Some(Arc::new(bedrock::embeddings(&config.bedrock, env)?))
    } else {
        None
    };
    let deps = StoreDeps {
        connector: Arc::new(OracleConnector),
        embeddings,
        blob_store: config.storage.blob_store()?,
        status: StatusBoard::new(),
    };
    Ok(build_store(config, records, &deps)?)
}

fn read_records(path: &Path) -> anyhow::Result<Vec<IngestRecord>> {
    let file = std::fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut records = Vec::new();
    for (n, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value =
            serde_json::from_str(&line).with_context(|| format!("{}:{}: invalid JSON", path.display(), n + 1))?;
        match IngestRecord::from_json(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!("{}:{}: skipped: {e}", path.display(), n + 1),
        }
    }
    Ok(records)
}
