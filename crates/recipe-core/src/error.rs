//! Error kinds for configuration loading and trace persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Startup-time configuration failure. Fatal for the gateway.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered config sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// One or more required provider settings are absent. Holds every missing key.
    #[error("missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<String>),
}

/// Trace file read/write failure. Logged by [`crate::TraceLogger::record`], never surfaced to callers.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("trace file I/O failed for {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("trace file is not a valid record list: {0}")]
    Json(#[from] serde_json::Error),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
