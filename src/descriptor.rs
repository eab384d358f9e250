//! Fragment descriptors: which images make up one output row.
//!
//! The fragment planner hands every scan worker a data-source string of the form
//!
//! ```text
//! <prefix>|<path1>,<labelIndex1>/<labelCount1>|<path2>,<labelIndex2>/<labelCount2>|...
//! ```
//!
//! where each path is relative to `prefix` and the label pair is the one-hot position of
//! the image's directory. [`parse_descriptor`] turns that string into a
//! [`FragmentRequest`]; [`render_descriptor`] produces it.
//!
//! # Example
//!
//! ```
//! use ironpix::descriptor::parse_descriptor;
//!
//! let request = parse_descriptor("file:///data|cats/1.png,0/2|dogs/7.png,1/2")?;
//! assert_eq!(request.len(), 2);
//!
//! let first = &request.descriptors()[0];
//! assert_eq!(first.path(), "file:///data/cats/1.png");
//! assert_eq!(first.full_path(), "/data/cats/1.png");
//! assert_eq!(first.file_name(), "1.png");
//! assert_eq!(first.parent_dir(), "cats");
//! assert_eq!(first.one_hot(), vec![1, 0]);
//! # Ok::<(), ironpix::IngestError>(())
//! ```

use crate::error::{IngestError, Result};
use crate::storage::helpers::path_of;
use std::path::Path;

/// Separates the prefix and the entries.
pub const ENTRY_SEPARATOR: char = '|';
/// Separates an entry's path from its label pair.
pub const LABEL_SEPARATOR: char = ',';
/// Separates the label index from the label count.
pub const INDEX_SEPARATOR: char = '/';

/// One source image and its one-hot label position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    path: String,
    label_index: usize,
    label_count: usize,
    full_path: String,
    file_name: String,
    parent_dir: String,
}

impl ImageDescriptor {
    /// Builds a descriptor for `path` (a URI or plain path).
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MalformedDescriptor`] if `label_index >= label_count`
    /// or the path is not a valid URI.
    pub fn new(path: impl Into<String>, label_index: usize, label_count: usize) -> Result<Self> {
        let path = path.into();
        if label_index >= label_count {
            return Err(IngestError::malformed(
                &path,
                format!("label index {label_index} is not below label count {label_count}"),
            ));
        }
        let full_path = path_of(&path).map_err(|e| IngestError::malformed(&path, e.message))?;
        let as_path = Path::new(&full_path);
        let file_name = as_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent_dir = as_path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path,
            label_index,
            label_count,
            full_path,
            file_name,
            parent_dir,
        })
    }

    /// The URI the image is read from.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn label_index(&self) -> usize {
        self.label_index
    }

    #[must_use]
    pub const fn label_count(&self) -> usize {
        self.label_count
    }

    /// The URI's path component, without scheme or authority.
    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Name of the directory holding the image; empty for files at the root.
    #[must_use]
    pub fn parent_dir(&self) -> &str {
        &self.parent_dir
    }

    /// One-hot label vector: `label_count` entries, a single `1` at `label_index`.
    #[must_use]
    pub fn one_hot(&self) -> Vec<u8> {
        let mut v = vec![0u8; self.label_count];
        v[self.label_index] = 1;
        v
    }
}

/// The ordered images assigned to one output row.
///
/// Order is significant: every output column is emitted in this order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentRequest {
    prefix: String,
    descriptors: Vec<ImageDescriptor>,
}

impl FragmentRequest {
    #[must_use]
    pub fn new(prefix: impl Into<String>, descriptors: Vec<ImageDescriptor>) -> Self {
        Self {
            prefix: prefix.into(),
            descriptors,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn descriptors(&self) -> &[ImageDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageDescriptor> {
        self.descriptors.iter()
    }

    /// Label vector length shared by every descriptor, if any.
    #[must_use]
    pub fn label_count(&self) -> Option<usize> {
        self.descriptors.first().map(ImageDescriptor::label_count)
    }
}

impl<'a> IntoIterator for &'a FragmentRequest {
    type Item = &'a ImageDescriptor;
    type IntoIter = std::slice::Iter<'a, ImageDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

/// Parse a data-source descriptor string into a [`FragmentRequest`].
///
/// Each entry's path is joined to the prefix with `/`. The label pair is taken after the
/// *last* comma of the entry, so paths may themselves contain commas.
///
/// # Errors
///
/// Returns [`IngestError::MalformedDescriptor`] if any entry is empty, lacks the
/// `path,index/total` shape, has `index >= total`, or disagrees with the first entry's
/// label count.
pub fn parse_descriptor(data_source: &str) -> Result<FragmentRequest> {
    let mut parts = data_source.split(ENTRY_SEPARATOR);
    let prefix = parts.next().unwrap_or_default();

    let mut descriptors: Vec<ImageDescriptor> = Vec::new();
    for entry in parts {
        let descriptor = parse_entry(prefix, entry)?;
        if let Some(first) = descriptors.first()
            && first.label_count() != descriptor.label_count()
        {
            return Err(IngestError::malformed(
                entry,
                format!(
                    "label count {} differs from the fragment's {}",
                    descriptor.label_count(),
                    first.label_count()
                ),
            ));
        }
        descriptors.push(descriptor);
    }

    Ok(FragmentRequest::new(prefix, descriptors))
}

fn parse_entry(prefix: &str, entry: &str) -> Result<ImageDescriptor> {
    let (path, labels) = entry
        .rsplit_once(LABEL_SEPARATOR)
        .ok_or_else(|| IngestError::malformed(entry, "missing ',<index>/<total>' label pair"))?;
    if path.is_empty() {
        return Err(IngestError::malformed(entry, "empty path"));
    }
    let (index, total) = labels
        .split_once(INDEX_SEPARATOR)
        .ok_or_else(|| IngestError::malformed(entry, "label pair must be '<index>/<total>'"))?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|e| IngestError::malformed(entry, format!("label index: {e}")))?;
    let total: usize = total
        .trim()
        .parse()
        .map_err(|e| IngestError::malformed(entry, format!("label count: {e}")))?;

    ImageDescriptor::new(format!("{prefix}/{path}"), index, total)
        .map_err(|e| match e {
            IngestError::MalformedDescriptor { reason, .. } => IngestError::malformed(entry, reason),
            other => other,
        })
}

/// Render the descriptor string for `prefix` and `(relative path, index, count)` entries.
///
/// This is the exact form [`parse_descriptor`] accepts.
#[must_use]
pub fn render_descriptor<S: AsRef<str>>(prefix: &str, entries: &[(S, usize, usize)]) -> String {
    let mut out = String::from(prefix);
    for (path, index, count) in entries {
        out.push(ENTRY_SEPARATOR);
        out.push_str(path.as_ref());
        out.push(LABEL_SEPARATOR);
        out.push_str(&index.to_string());
        out.push(INDEX_SEPARATOR);
        out.push_str(&count.to_string());
    }
    out
}
