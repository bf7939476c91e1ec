//! Error types for the decoder and its signature database

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can escape a lookup or a call to `decode`.
///
/// Schema mismatches and non-printable payloads are not errors; they are
/// folded into the ranked result set instead.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid selector {0:?}")]
    InvalidSelector(String),

    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    #[error("Contents of {prefix}.json is invalid: {reason}")]
    CorruptShard { prefix: String, reason: String },

    #[error("Failed to parse error signature '{signature}': {reason}")]
    SignatureParse { signature: String, reason: String },

    #[error("No ABI found in {0}")]
    InvalidAbi(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl DecodeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
