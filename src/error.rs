use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a model file or its key cache.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid safetensors header in {path}: {reason}")]
    Header { path: PathBuf, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoaderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoaderError::Io { path: path.into(), source }
    }

    pub(crate) fn header(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoaderError::Header { path: path.into(), reason: reason.into() }
    }
}

/// A weight key that does not follow the naming convention it was matched to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Key '{key}' has too few segments for its naming convention")]
    TooFewSegments { key: String },

    #[error("Block label '{label}' does not split into the expected parts")]
    BadShape { label: String },

    #[error("Block index '{index}' in '{label}' is not an integer")]
    BadIndex { label: String, index: String },
}

/// Errors raised while loading or saving helper settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}
