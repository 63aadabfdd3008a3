// error.rs — Error types for the state store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing state domains.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A domain value could not be serialized.
    #[error("failed to serialize domain '{domain}': {source}")]
    Serialization {
        domain: String,
        source: serde_json::Error,
    },

    /// The state directory lock could not be acquired.
    #[error("failed to lock state directory at {path}: {source}")]
    Lock {
        path: PathBuf,
        source: std::io::Error,
    },
}
