//! Synthetic images and fragments.

use crate::descriptor::render_descriptor;
use crate::storage::{MemoryFileSystem, SchemeRegistry};
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Encode a `width x height` PNG whose pixel at `(x, y)` is `pixel(x, y)`.
///
/// # Errors
///
/// Returns an error if the PNG encoder fails.
///
/// # Example
///
/// ```
/// use ironpix::testing::png_bytes;
///
/// let png = png_bytes(4, 2, |x, y| [x as u8, y as u8, 0])?;
/// assert_eq!(&png[1..4], b"PNG");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn png_bytes<F>(width: u32, height: u32, pixel: F) -> Result<Vec<u8>>
where
    F: Fn(u32, u32) -> [u8; 3],
{
    let image = RgbImage::from_fn(width, height, |x, y| Rgb(pixel(x, y)));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .context("encoding fixture PNG")?;
    Ok(out.into_inner())
}

/// A PNG filled with one color.
///
/// # Errors
///
/// Returns an error if the PNG encoder fails.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Result<Vec<u8>> {
    png_bytes(width, height, |_, _| rgb)
}

/// A fragment held in a [`MemoryFileSystem`].
///
/// Entries keep insertion order, which is the descriptor order of the rendered string.
#[derive(Debug, Clone)]
pub struct FragmentFixture {
    prefix: String,
    fs: MemoryFileSystem,
    entries: Vec<(String, usize, usize)>,
}

impl FragmentFixture {
    /// `prefix` should use the `mem` scheme, e.g. `mem:///photos`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            fs: MemoryFileSystem::new(),
            entries: Vec::new(),
        }
    }

    /// Adds a file with arbitrary content (not necessarily an image).
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URI cannot be stored.
    pub fn add_file(
        &mut self,
        relative: &str,
        label_index: usize,
        label_count: usize,
        data: impl Into<Vec<u8>>,
    ) -> Result<&mut Self> {
        let uri = format!("{}/{relative}", self.prefix);
        self.fs
            .put(&uri, data)
            .with_context(|| format!("storing fixture {uri}"))?;
        self.entries
            .push((relative.to_string(), label_index, label_count));
        Ok(self)
    }

    /// Adds a PNG rendered by [`png_bytes`].
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or storing fails.
    pub fn add_png<F>(
        &mut self,
        relative: &str,
        label_index: usize,
        label_count: usize,
        width: u32,
        height: u32,
        pixel: F,
    ) -> Result<&mut Self>
    where
        F: Fn(u32, u32) -> [u8; 3],
    {
        let png = png_bytes(width, height, pixel)?;
        self.add_file(relative, label_index, label_count, png)
    }

    /// Adds a single-color PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or storing fails.
    pub fn add_solid(
        &mut self,
        relative: &str,
        label_index: usize,
        label_count: usize,
        width: u32,
        height: u32,
        rgb: [u8; 3],
    ) -> Result<&mut Self> {
        self.add_png(relative, label_index, label_count, width, height, |_, _| rgb)
    }

    /// The descriptor string a planner would emit for this fragment.
    #[must_use]
    pub fn descriptor(&self) -> String {
        render_descriptor(&self.prefix, &self.entries)
    }

    /// A resolver serving this fixture's files under the `mem` scheme.
    #[must_use]
    pub fn resolver(&self) -> Arc<SchemeRegistry> {
        Arc::new(SchemeRegistry::default().register(Arc::new(self.fs.clone())))
    }

    #[must_use]
    pub const fn filesystem(&self) -> &MemoryFileSystem {
        &self.fs
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write solid-color PNGs of `width x height` into a fresh temporary directory.
///
/// `files` are `(relative path, color)` pairs; parent directories are created. Returns the
/// directory guard; its path is the descriptor prefix for the written files.
///
/// # Errors
///
/// Returns an error if the directory or a file cannot be written.
pub fn write_png_tree(width: u32, height: u32, files: &[(&str, [u8; 3])]) -> Result<TempDir> {
    let dir = tempfile::tempdir().context("creating fixture directory")?;
    for (relative, rgb) in files {
        write_file(dir.path(), relative, &solid_png(width, height, *rgb)?)?;
    }
    Ok(dir)
}

/// Write `data` to `root/relative`, creating parent directories.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be written.
pub fn write_file(root: &Path, relative: &str, data: &[u8]) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, data).with_context(|| format!("writing {}", path.display()))
}
