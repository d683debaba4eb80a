use thiserror::Error;

pub type Result<T> = std::result::Result<T, KokobotError>;

#[derive(Error, Debug)]
pub enum KokobotError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Completion service error: {0}")]
    CompletionService(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content error: {0}")]
    Content(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod content;
pub mod embeddings;
pub mod indexer;
pub mod query;
pub mod server;
pub mod store;
