//! In-memory filesystem for tests and fixtures.
//!
//! Files are keyed by the path component of their URI, so `mem:///images/a.png` and
//! `mem://any-host/images/a.png` name the same file. Every successful `open` is counted,
//! which lets tests assert that a code path performed no I/O.

use crate::storage::helpers::path_of;
use crate::storage::traits::{ByteStream, ErrorKind, FileSystem, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type FileStorage = Arc<Mutex<BTreeMap<String, Arc<Vec<u8>>>>>;

#[derive(Clone)]
pub struct MemoryFileSystem {
    scheme: String,
    files: FileStorage,
    opens: Arc<AtomicUsize>,
}

impl MemoryFileSystem {
    /// Creates an empty filesystem serving the `mem` scheme.
    #[must_use]
    pub fn new() -> Self {
        Self::with_scheme("mem")
    }

    #[must_use]
    pub fn with_scheme(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            files: Arc::new(Mutex::new(BTreeMap::new())),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stores `data` under the path of `uri`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI cannot be parsed
    ///
    /// # Panics
    ///
    /// Panics if the mutex protecting the files is poisoned.
    pub fn put(&self, uri: &str, data: impl Into<Vec<u8>>) -> StorageResult<()> {
        let key = path_of(uri)?;
        self.files
            .lock()
            .expect("files mutex poisoned")
            .insert(key, Arc::new(data.into()));
        Ok(())
    }

    /// Number of successful `open` calls so far.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// # Panics
    ///
    /// Panics if the mutex protecting the files is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.lock().expect("files mutex poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFileSystem")
            .field("scheme", &self.scheme)
            .field("opens", &self.open_count())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MemoryFileSystem {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn open(&self, uri: &str) -> StorageResult<Box<dyn ByteStream>> {
        let key = path_of(uri)?;
        let data = self
            .files
            .lock()
            .map_err(|_| StorageError::new(ErrorKind::Other, "files mutex poisoned"))?
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::new(ErrorKind::NotFound, format!("{key} not found")))?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Cursor::new(SharedBytes(data))))
    }

    fn list(&self, pattern: &str) -> StorageResult<Vec<String>> {
        let key_pattern = path_of(pattern)?;
        let matcher = glob::Pattern::new(&key_pattern).map_err(|e| {
            StorageError::new(
                ErrorKind::InvalidInput,
                format!("invalid glob pattern {pattern}: {e}"),
            )
        })?;
        let files = self
            .files
            .lock()
            .map_err(|_| StorageError::new(ErrorKind::Other, "files mutex poisoned"))?;
        // BTreeMap keys are already sorted
        Ok(files
            .keys()
            .filter(|k| matcher.matches(k))
            .map(|k| format!("{}://{}", self.scheme, k))
            .collect())
    }
}

/// Cheaply cloned file content handed to readers.
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}
