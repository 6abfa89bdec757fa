//! Error types for the collaborator I/O boundary
//!
//! The diff, rule and detector components return plain values; only loading
//! snapshots, corpora, label mappings and configuration can fail.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, CompatError>;

#[derive(Error, Debug)]
pub enum CompatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid label pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A single corpus file that could not be read; the batch continues without it
#[derive(Error, Debug)]
#[error("{}: {source}", .path.display())]
pub struct CorpusError {
    pub path: PathBuf,
    #[source]
    pub source: CompatError,
}
