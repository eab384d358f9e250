//! Scheme-to-filesystem registry.

use crate::storage::helpers::scheme_of;
use crate::storage::local::LocalFileSystem;
use crate::storage::traits::{
    ErrorKind, FileSystem, FileSystemResolver, StorageError, StorageResult,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves filesystems by URI scheme.
///
/// [`SchemeRegistry::default`] serves local files only; register further schemes with
/// [`SchemeRegistry::register`].
#[derive(Clone)]
pub struct SchemeRegistry {
    filesystems: HashMap<String, Arc<dyn FileSystem>>,
}

impl SchemeRegistry {
    /// An empty registry that resolves nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            filesystems: HashMap::new(),
        }
    }

    /// Registers `fs` under its own scheme, replacing any previous handle.
    #[must_use]
    pub fn register(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.filesystems.insert(fs.scheme().to_string(), fs);
        self
    }

    #[must_use]
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.filesystems.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }
}

impl std::fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::empty().register(Arc::new(LocalFileSystem::new()))
    }
}

impl FileSystemResolver for SchemeRegistry {
    fn resolve(&self, uri: &str) -> StorageResult<Arc<dyn FileSystem>> {
        let scheme = scheme_of(uri)?;
        self.filesystems.get(&scheme).cloned().ok_or_else(|| {
            StorageError::new(
                ErrorKind::UnsupportedScheme,
                format!("no filesystem registered for scheme '{scheme}'"),
            )
        })
    }
}
