#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::embeddings::chunking::ChunkingConfig;

/// Environment variable holding the watsonx.ai API key.
pub const ENV_API_KEY: &str = "WATSONX_API_KEY";
/// Environment variable holding the watsonx.ai project id.
pub const ENV_PROJECT_ID: &str = "WATSONX_PROJECT_ID";

const CONFIG_FILE_NAME: &str = "sahay.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub watsonx: WatsonxConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Path to the source PDF, relative to the base directory.
    #[serde(default = "default_pdf_path")]
    pub pdf_path: PathBuf,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatsonxConfig {
    pub endpoint: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub embedding_dimension: u32,
    pub batch_size: u32,
}

impl Default for WatsonxConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://us-south.ml.cloud.ibm.com".to_string(),
            embedding_model: "ibm/slate-30m-english-rtrvr".to_string(),
            generation_model: "ibm/granite-13b-chat-v2".to_string(),
            embedding_dimension: 384,
            batch_size: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of passages retrieved for each question.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }
}

fn default_pdf_path() -> PathBuf {
    PathBuf::from("data/pm_kisan_rules.pdf")
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            watsonx: WatsonxConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            server: ServerConfig::default(),
            pdf_path: default_pdf_path(),
            base_dir: PathBuf::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set; export it (or place it in your shell environment) before running")]
    MissingCredential(&'static str),
    #[error("{0} is set but empty")]
    EmptyCredential(&'static str),
    #[error("Invalid watsonx endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid chunk size: {0} (must be at least 1)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than the chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid retrieval top_k: {0} (must be at least 1)")]
    InvalidTopK(usize),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Config {
    /// Load configuration from `sahay.toml` in the base directory, falling
    /// back to defaults when the file does not exist.
    #[inline]
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str::<Config>(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            Config::default()
        };
        config.base_dir = base_dir.as_ref().to_path_buf();

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.watsonx.validate()?;

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.chunking.chunk_size));
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.chunking.overlap,
                self.chunking.chunk_size,
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidTopK(self.retrieval.top_k));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort(self.server.port));
        }

        Ok(())
    }

    /// Path to the source PDF, resolved against the base directory.
    #[inline]
    pub fn document_path(&self) -> PathBuf {
        self.base_dir.join(&self.pdf_path)
    }

    /// Directory holding the persisted vector index.
    #[inline]
    pub fn index_dir(&self) -> PathBuf {
        self.base_dir.join("data").join("vector_db")
    }

    /// Path to the append-only interaction log.
    #[inline]
    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join("logs").join("interactions.jsonl")
    }
}

impl WatsonxConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }
        if self.generation_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.generation_model.clone()));
        }
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        if !(64..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.endpoint).map_err(|_| ConfigError::InvalidEndpoint(self.endpoint.clone()))
    }
}

/// Secrets for the hosted watsonx.ai endpoints. Read once at startup so a
/// missing credential fails before any network call is attempted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: String,
    pub project_id: String,
}

impl Credentials {
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: read_required_env(ENV_API_KEY)?,
            project_id: read_required_env(ENV_PROJECT_ID)?,
        })
    }
}

fn read_required_env(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::EmptyCredential(name)),
        Ok(value) => Ok(value),
        Err(_) => Err(ConfigError::MissingCredential(name)),
    }
}
