//! Local filesystem backed by `std::fs`.

use crate::storage::helpers::DEFAULT_SCHEME;
use crate::storage::traits::{ByteStream, ErrorKind, FileSystem, StorageError, StorageResult};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use url::Url;

/// Serves `file://` URIs and plain paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn to_path(uri: &str) -> StorageResult<PathBuf> {
        if !uri.contains("://") {
            return Ok(PathBuf::from(uri));
        }
        let parsed = Url::parse(uri).map_err(|e| {
            StorageError::new(ErrorKind::InvalidInput, format!("invalid URI {uri}: {e}"))
        })?;
        if parsed.scheme() != DEFAULT_SCHEME {
            return Err(StorageError::new(
                ErrorKind::UnsupportedScheme,
                format!("local filesystem cannot serve {uri}"),
            ));
        }
        parsed.to_file_path().map_err(|()| {
            StorageError::new(ErrorKind::InvalidInput, format!("not a local path: {uri}"))
        })
    }
}

impl FileSystem for LocalFileSystem {
    fn scheme(&self) -> &str {
        DEFAULT_SCHEME
    }

    fn open(&self, uri: &str) -> StorageResult<Box<dyn ByteStream>> {
        let path = Self::to_path(uri)?;
        let file = File::open(&path).map_err(|e| {
            let mut err = StorageError::from(e);
            err.message = format!("open {}: {}", path.display(), err.message);
            err
        })?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn list(&self, pattern: &str) -> StorageResult<Vec<String>> {
        let pattern_path = Self::to_path(pattern)?;
        let pattern_str = pattern_path.to_string_lossy();
        let entries = glob::glob(&pattern_str).map_err(|e| {
            StorageError::new(
                ErrorKind::InvalidInput,
                format!("invalid glob pattern {pattern}: {e}"),
            )
        })?;

        let mut result = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StorageError::new(ErrorKind::Io, e.to_string()))?;
            // Only include actual files, not directories
            if path.is_file() {
                result.push(path.to_string_lossy().into_owned());
            }
        }
        result.sort();
        Ok(result)
    }

    fn exists(&self, uri: &str) -> bool {
        Self::to_path(uri).is_ok_and(|p| p.is_file())
    }
}
