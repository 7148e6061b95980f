//! Error types for the byte-level BPE library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tokenizer library.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// Error loading a trained artifact
    #[error("Load error: {0}")]
    Load(String),

    /// Error saving a trained artifact
    #[error("Save error: {0}")]
    Save(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The pre-tokenization grammar failed to compile or to match
    #[error("Regex error: {0}")]
    Regex(String),

    /// Invalid configuration, reported before any work starts
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Token ID outside the vocabulary
    #[error("Unknown token ID: {0}")]
    UnknownTokenId(u32),

    /// Byte sequence with no vocabulary entry.
    ///
    /// Encoding only ever produces base bytes and merge results, so this
    /// means the vocabulary and merge list do not belong together.
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    /// Merge rule whose operands or result are missing from the vocabulary
    #[error("Invalid merge rule: {0}")]
    InvalidMerge(String),
}

impl TokenizerError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }
}

impl From<fancy_regex::Error> for TokenizerError {
    fn from(err: fancy_regex::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

/// Result type alias for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizerError>;
