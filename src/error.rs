//! Error types for statement extraction and ledger storage

use std::path::PathBuf;
use thiserror::Error;

/// Failures that make a single statement unusable.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{tool} not installed (poppler-utils): {reason}")]
    ToolMissing { tool: String, reason: String },

    #[error("failed to run {tool} on {path:?}: {source}")]
    Spawn {
        tool: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed on {path:?} (exit {code}): {stderr}")]
    ToolFailed {
        tool: String,
        path: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("{0:?} appears scanned/image-only: no text extracted")]
    EmptyText(PathBuf),

    #[error("invalid file name {0:?}")]
    FileName(PathBuf),
}

/// Ledger persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not read ledger {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write ledger {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unrecognised ledger layout: {0}")]
    UnknownLayout(String),

    #[error("ledger schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}
