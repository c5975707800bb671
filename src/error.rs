//! Error types for latente
//!
//! Every fallible operation in the crate returns [`Result`]. Missing
//! resources (checkpoints, unloaded index/store) get their own variants so
//! callers can tell them apart from I/O or format failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for latente operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while training, indexing or searching.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error (checkpoints, index, store).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is invalid or unreadable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Checkpoint path does not reference an existing file.
    #[error("Checkpoint file not found: {}", path.display())]
    CheckpointNotFound { path: PathBuf },

    /// Search service used before its artefacts were attached.
    #[error("Search service not initialized: {0} not loaded")]
    NotInitialized(&'static str),

    /// Tensor or parameter shape mismatch.
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Latent index misuse or corrupt index.
    #[error("Index error: {0}")]
    Index(String),

    /// Image decode/encode failure.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Parameter tensor contains NaN or infinite values.
    #[error("Non-finite values in parameter '{name}' ({count} entries)")]
    NonFinite { name: String, count: usize },
}

impl Error {
    /// Shorthand for a shape mismatch error.
    pub fn shape(what: impl Into<String>, expected: Vec<usize>, actual: Vec<usize>) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Whether this error reports a missing resource rather than a failure.
    pub fn is_missing_resource(&self) -> bool {
        matches!(self, Self::CheckpointNotFound { .. } | Self::NotInitialized(_))
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(format!("bincode: {e}"))
    }
}

impl From<safetensors::SafeTensorError> for Error {
    fn from(e: safetensors::SafeTensorError) -> Self {
        Self::Serialization(format!("SafeTensors: {e}"))
    }
}
