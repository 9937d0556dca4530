//! Error types for the agro workspace.
//!
//! One enum covers every failure category the pipeline can surface:
//! configuration, I/O, ingestion, index lifecycle, and external capabilities.

use thiserror::Error;

/// Unified error type for the agro crates.
///
/// Library functions return `Result<T, AppError>`. Capability failures are
/// recovered inside the query pipeline and never reach its caller.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable source documents were found
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// An index build was requested over zero chunks
    #[error("Index is empty: {0}")]
    IndexEmpty(String),

    /// Index storage, loading, or search errors
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding, rerank, or reading-comprehension calls failed or timed out
    #[error("Capability error: {0}")]
    Capability(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
