use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the call-log pipeline.
#[derive(Error, Debug)]
pub enum EtlError {
    /// An input CSV does not exist at the configured path.
    #[error("File {0} not found")]
    MissingSource(PathBuf),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV record could not be decoded or encoded.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The relational store rejected an operation.
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A report destination could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be produced.
    #[error("Failed to serialise JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EtlError {
    /// Classify an `open` failure on `path`, mapping "not found" to
    /// [`EtlError::MissingSource`].
    pub fn from_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            EtlError::MissingSource(path)
        } else {
            EtlError::FileRead { path, source }
        }
    }

    /// `true` when the error only means an input file was absent.
    pub fn is_missing_source(&self) -> bool {
        matches!(self, EtlError::MissingSource(_))
    }
}

/// Convenience alias used throughout the pipeline crates.
pub type Result<T> = std::result::Result<T, EtlError>;
