//! Filesystem abstractions for reading image files.
//!
//! The fetch engine needs one seekable byte stream per image path and a handle that can be
//! shared read-only across concurrent workers. This module provides:
//!
//! - **Traits** - [`FileSystem`] (open / list) and [`FileSystemResolver`] (scheme lookup)
//! - **Local access** - [`LocalFileSystem`] for `file://` URIs and plain paths
//! - **In-memory access** - [`MemoryFileSystem`] for tests, with open counting
//! - **Scheme registry** - [`SchemeRegistry`] mapping URI schemes to handles
//! - **Helpers** - URI splitting shared with the descriptor model
//!
//! ## Usage
//!
//! ```
//! use ironpix::storage::*;
//! use std::sync::Arc;
//!
//! # fn main() -> StorageResult<()> {
//! let memory = MemoryFileSystem::new();
//! memory.put("mem:///images/cats/1.png", b"not really a png".to_vec())?;
//!
//! let registry = SchemeRegistry::default().register(Arc::new(memory.clone()));
//! let fs = registry.resolve("mem:///images/cats/1.png")?;
//! assert!(fs.exists("mem:///images/cats/1.png"));
//! assert_eq!(fs.list("mem:///images/*/*.png")?.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod helpers;
pub mod local;
pub mod memory;
pub mod registry;
pub mod traits;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;
pub use registry::SchemeRegistry;
pub use traits::*;
