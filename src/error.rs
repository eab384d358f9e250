//! Error taxonomy for fragment ingestion.
//!
//! Every variant is fatal for the row being built: the engines never retry and never emit a
//! partial row. Non-owning scan workers are not an error; they simply produce no row.

use crate::storage::StorageError;
use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("malformed descriptor entry '{entry}': {reason}")]
    MalformedDescriptor { entry: String, reason: String },

    #[error("filesystem unavailable for '{uri}': {reason}")]
    FilesystemUnavailable { uri: String, reason: String },

    #[error("unable to read image data in {path}: {reason}")]
    ImageDecodeFailed { path: String, reason: String },

    #[error("image {path} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        path: String,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("fragment has no image descriptors")]
    EmptyFragment,

    #[error("first fetch chunk yielded no decoded images")]
    NoDecodedImages,

    #[error("failed to encode image #{index}: {reason}")]
    EncodeFailed { index: usize, reason: String },

    #[error("image stream is exhausted")]
    StreamExhausted,

    #[error("engine was not opened")]
    NotOpen,

    #[error("invalid option {option}: {reason}")]
    Config { option: String, reason: String },

    #[error("worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub(crate) fn malformed(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            option: option.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(uri: impl Into<String>, err: &StorageError) -> Self {
        Self::FilesystemUnavailable {
            uri: uri.into(),
            reason: err.to_string(),
        }
    }
}
