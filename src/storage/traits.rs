//! Core traits for filesystem access.
//!
//! The engines only ever need two things from a backing store: a seekable byte stream per
//! path, and a way to pick the right store for a URI scheme. Listing is provided for
//! planners and harnesses that enumerate image directories.

use std::error::Error;
use std::fmt;
use std::io::{Read, Seek};
use std::sync::Arc;

// ============================================================================
// Core Error Type
// ============================================================================

/// Error type for filesystem operations
#[derive(Debug, Clone)]
pub struct StorageError {
    pub message: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    PermissionDenied,
    UnsupportedScheme,
    Io,
    Other,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for StorageError {}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
            _ => ErrorKind::Io,
        };
        Self::new(kind, err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================================
// Streams and Filesystems
// ============================================================================

/// A seekable byte stream over one file.
pub trait ByteStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> ByteStream for T {}

/// A filesystem handle shared read-only by every fetch worker of one engine.
pub trait FileSystem: Send + Sync {
    /// The URI scheme this handle serves (e.g. `"file"`).
    fn scheme(&self) -> &str;

    /// Open a seekable stream over the file named by `uri`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened
    fn open(&self, uri: &str) -> StorageResult<Box<dyn ByteStream>>;

    /// List files matching a glob pattern, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the listing fails
    fn list(&self, pattern: &str) -> StorageResult<Vec<String>>;

    /// Check whether a file exists
    fn exists(&self, uri: &str) -> bool {
        self.open(uri).is_ok()
    }
}

/// Resolves the filesystem handle responsible for a URI.
pub trait FileSystemResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no filesystem can serve the URI's scheme
    fn resolve(&self, uri: &str) -> StorageResult<Arc<dyn FileSystem>>;
}
