use thiserror::Error;

pub type Result<T> = std::result::Result<T, SahayError>;

#[derive(Error, Debug)]
pub enum SahayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document read error: {0}")]
    DocumentRead(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index not found at {0}; run `sahay ingest` to build it")]
    IndexNotFound(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod generation;
pub mod index;
pub mod observability;
pub mod retriever;
pub mod server;
