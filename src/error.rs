//! Error types for tradematch

use thiserror::Error;

/// Main error type for tradematch
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid execution: {0}")]
    InvalidExecution(String),

    #[error("Reference data error: {0}")]
    ReferenceData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for tradematch operations
pub type Result<T> = std::result::Result<T, EngineError>;
