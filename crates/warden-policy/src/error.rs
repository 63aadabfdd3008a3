// error.rs — Error types for the policy subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading policy configuration or handling events.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The hook payload could not be understood.
    #[error("malformed hook event: {0}")]
    MalformedEvent(String),

    /// The config file exists but could not be read.
    #[error("failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("invalid config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A state domain enforcement depends on could not be loaded or persisted.
    #[error(transparent)]
    Store(#[from] warden_state::StoreError),
}
