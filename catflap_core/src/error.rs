//! Error types for catflap_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using catflap_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while collecting, hashing or reconciling sync objects.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A sync object does not exist on disk.
    #[error("Path does not exist: {path}")]
    NotFound { path: PathBuf },

    /// A path exists but is neither a regular file nor a directory.
    #[error("Unsupported file type: {path}")]
    UnsupportedFileType { path: PathBuf },

    /// Hashing a file failed. No hashes are recorded for the entry.
    #[error("Failed to hash {path}: {source}")]
    Hashing {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stored mtime could not be parsed as an ISO-8601 timestamp.
    #[error("Invalid timestamp: {value}")]
    InvalidTimestamp { value: String },

    /// The manifest document is malformed.
    #[error("Invalid manifest at {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },
}

impl Error {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound { path: path.into() }
    }

    /// Create an UnsupportedFileType error.
    pub fn unsupported_file_type(path: impl Into<PathBuf>) -> Self {
        Error::UnsupportedFileType { path: path.into() }
    }

    /// Create a Hashing error.
    pub fn hashing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Hashing {
            path: path.into(),
            source,
        }
    }

    /// Create an InvalidTimestamp error.
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Error::InvalidTimestamp {
            value: value.into(),
        }
    }

    /// Create an InvalidManifest error.
    pub fn invalid_manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidManifest {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Whether this error means the object is missing from disk.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Io { source } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
