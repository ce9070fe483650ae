//! Error taxonomy for the extraction and correlation pipeline
//!
//! Only structural problems are errors. Missing counts and missing source
//! spans are soft: they default to zero or to placeholder text and never
//! surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a comparison run
#[derive(Error, Debug)]
pub enum ParityError {
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The two implementations have drifted apart: a target exists on the GS
    /// side of the comparison but cannot be resolved in the host module.
    #[error("Target function `{name}` cannot be resolved in the host module")]
    UnresolvedHostFunction { name: String },

    #[error("Failed to parse host source: {0}")]
    HostParse(String),

    #[error("Invalid host count table {}: {reason}", path.display())]
    InvalidCountTable { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ParityError>;

/// Read a whole input file, mapping failures onto the offending path
pub fn read_input(path: &std::path::Path) -> Result<String> {
    if !path.exists() {
        return Err(ParityError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| ParityError::Io {
        path: path.to_path_buf(),
        source,
    })
}
