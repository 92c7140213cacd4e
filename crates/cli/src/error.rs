//! Error types for CLI operations.

use std::path::Path;

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parsing error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    /// No sink on the command line, in the run file or in the store
    #[error(
        "No sink configured: pass --sink-type (and --sink-param) once, \
         add a [sink] table to the run file, or provide {store}"
    )]
    SinkMissing { store: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn sink_missing(store: &Path) -> Self {
        Self::SinkMissing {
            store: store.display().to_string(),
        }
    }
}

impl From<ContractError> for CliError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::ConfigValidation { .. } => Self::ConfigValidation {
                message: err.to_string(),
            },
            ContractError::Io(e) => Self::Io(e),
            other => Self::ConfigParse {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
