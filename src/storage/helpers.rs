//! URI helpers shared by the filesystems and the descriptor model.
//!
//! Descriptor paths are either full URIs (`file:///data/cats/1.png`,
//! `hdfs://namenode:8020/data/cats/1.png`) or plain absolute paths. Plain paths belong to
//! the local filesystem.

use crate::storage::traits::{ErrorKind, StorageError, StorageResult};
use percent_encoding::percent_decode_str;
use url::Url;

/// Scheme used for paths that carry none.
pub const DEFAULT_SCHEME: &str = "file";

/// Split a URI into `(scheme, path)`.
///
/// The path drops the scheme and any authority, so `hdfs://nn:8020/a/b.png` yields
/// `("hdfs", "/a/b.png")` and a plain `/a/b.png` yields `("file", "/a/b.png")`.
/// Percent escapes in a URI path are decoded; plain paths are returned as given.
///
/// # Errors
///
/// Returns an error if the URI is empty, cannot be parsed, or its decoded path is not UTF-8
pub fn split_uri(uri: &str) -> StorageResult<(String, String)> {
    if uri.is_empty() {
        return Err(StorageError::new(ErrorKind::InvalidInput, "empty URI"));
    }
    if !uri.contains("://") {
        return Ok((DEFAULT_SCHEME.to_string(), uri.to_string()));
    }
    let parsed = Url::parse(uri).map_err(|e| {
        StorageError::new(ErrorKind::InvalidInput, format!("invalid URI {uri}: {e}"))
    })?;
    let path = percent_decode_str(parsed.path()).decode_utf8().map_err(|e| {
        StorageError::new(ErrorKind::InvalidInput, format!("invalid path in {uri}: {e}"))
    })?;
    Ok((parsed.scheme().to_string(), path.into_owned()))
}

/// Scheme of a URI, defaulting to [`DEFAULT_SCHEME`].
///
/// # Errors
///
/// Returns an error if the URI cannot be parsed
pub fn scheme_of(uri: &str) -> StorageResult<String> {
    split_uri(uri).map(|(scheme, _)| scheme)
}

/// Path component of a URI.
///
/// # Errors
///
/// Returns an error if the URI cannot be parsed
pub fn path_of(uri: &str) -> StorageResult<String> {
    split_uri(uri).map(|(_, path)| path)
}
