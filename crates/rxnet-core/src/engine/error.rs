use crate::core::models::network::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Missing template: {path}")]
    MissingTemplate { path: PathBuf },

    #[error("Malformed coordinate template '{identifier}': {message}")]
    Template { identifier: String, message: String },

    #[error("Fragment mismatch for '{species}': expected {expected} atom lines, got {actual}")]
    FragmentMismatch {
        species: String,
        expected: usize,
        actual: usize,
    },

    #[error("No energy value found in output: {path}")]
    MissingEnergy { path: PathBuf },

    #[error("Output file not found: {path}")]
    MissingOutput { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
