//! Fetch engine: opens a fragment's images and decodes them chunk by chunk.
//!
//! The engine moves through `Unopened → Open → Exhausted`. Each [`FetchEngine::next_chunk`]
//! decodes the next `min(threads, remaining)` images concurrently and returns only once all
//! of them are done, in descriptor order. A single unreadable image fails the whole call;
//! there is no retry and no partial chunk.
//!
//! Every image of a run must share the first decoded image's dimensions; a different size
//! fails with [`IngestError::DimensionMismatch`].

use crate::codec::{DecodedImage, ImageDecoder, StandardDecoder};
use crate::config::AccessorConfig;
use crate::descriptor::FragmentRequest;
use crate::error::{IngestError, Result};
use crate::metrics::ScanMetrics;
use crate::pool::WorkerPool;
use crate::segment::SegmentGate;
use crate::storage::{FileSystem, FileSystemResolver};
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Unopened,
    Open,
    Exhausted,
}

pub struct FetchEngine {
    pool: WorkerPool,
    decoder: Arc<dyn ImageDecoder>,
    metrics: ScanMetrics,
    fs: Option<Arc<dyn FileSystem>>,
    paths: Vec<String>,
    cursor: usize,
    state: FetchState,
    dimensions: Option<(u32, u32)>,
    last_chunk: usize,
}

impl FetchEngine {
    #[must_use]
    pub fn new(pool: WorkerPool, decoder: Arc<dyn ImageDecoder>, metrics: ScanMetrics) -> Self {
        Self {
            pool,
            decoder,
            metrics,
            fs: None,
            paths: Vec::new(),
            cursor: 0,
            state: FetchState::Unopened,
            dimensions: None,
            last_chunk: 0,
        }
    }

    /// An engine with `config.threads` workers and the standard decoder.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::WorkerPool`] if the worker pool cannot be built.
    pub fn with_config(config: &AccessorConfig) -> Result<Self> {
        Ok(Self::new(
            WorkerPool::new(config.threads)?,
            Arc::new(StandardDecoder),
            ScanMetrics::new(),
        ))
    }

    /// Opens the fragment for reading.
    ///
    /// Returns `Ok(false)` without touching the filesystem when `gate` does not own the
    /// fragment. Otherwise the filesystem for the first descriptor's scheme is resolved and
    /// the engine becomes `Open`.
    ///
    /// # Errors
    ///
    /// - [`IngestError::EmptyFragment`] if the request has no descriptors
    /// - [`IngestError::FilesystemUnavailable`] if no filesystem serves the first path
    pub fn open(
        &mut self,
        request: &FragmentRequest,
        gate: &SegmentGate,
        resolver: &dyn FileSystemResolver,
    ) -> Result<bool> {
        if !gate.is_owner() {
            debug!(split_start = gate.split().start, "not the owning segment, skipping fragment");
            return Ok(false);
        }
        let first = request.descriptors().first().ok_or(IngestError::EmptyFragment)?;
        let fs = resolver
            .resolve(first.path())
            .map_err(|e| IngestError::unavailable(first.path(), &e))?;

        self.fs = Some(fs);
        self.paths = request.iter().map(|d| d.path().to_string()).collect();
        self.cursor = 0;
        self.dimensions = None;
        self.last_chunk = 0;
        self.state = FetchState::Open;
        debug!(
            images = self.paths.len(),
            threads = self.pool.threads(),
            "opened fragment"
        );
        Ok(true)
    }

    /// Decodes the next chunk, or returns `Ok(None)` once every image has been fetched.
    ///
    /// Calling again after the end is a no-op that keeps returning `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`IngestError::NotOpen`] if [`FetchEngine::open`] never succeeded
    /// - [`IngestError::ImageDecodeFailed`] naming the first unreadable image of the chunk
    /// - [`IngestError::DimensionMismatch`] if an image differs from the run's size
    pub fn next_chunk(&mut self) -> Result<Option<Vec<DecodedImage>>> {
        match self.state {
            FetchState::Unopened => return Err(IngestError::NotOpen),
            FetchState::Exhausted => return Ok(None),
            FetchState::Open => {}
        }
        let Some(fs) = self.fs.clone() else {
            return Err(IngestError::NotOpen);
        };
        let remaining = self.paths.len() - self.cursor;
        if remaining == 0 {
            self.state = FetchState::Exhausted;
            return Ok(None);
        }

        let size = self.pool.chunk_size(remaining);
        let chunk_paths = self.paths[self.cursor..self.cursor + size].to_vec();
        let decoder = Arc::clone(&self.decoder);
        let results = self
            .pool
            .run_chunk(chunk_paths.clone(), |_, path| {
                fetch_one(fs.as_ref(), decoder.as_ref(), &path)
            });

        let fetched = match results.into_iter().collect::<Result<Vec<_>>>() {
            Ok(fetched) => fetched,
            Err(err) => {
                self.state = FetchState::Exhausted;
                return Err(err);
            }
        };

        let mut bytes_read = 0u64;
        let mut images = Vec::with_capacity(fetched.len());
        for ((image, bytes), path) in fetched.into_iter().zip(&chunk_paths) {
            if let Err(err) = self.check_dimensions(&image, path) {
                self.state = FetchState::Exhausted;
                return Err(err);
            }
            bytes_read += bytes;
            images.push(image);
        }

        self.cursor += size;
        self.last_chunk = size;
        if self.cursor == self.paths.len() {
            self.state = FetchState::Exhausted;
        }
        self.metrics.record_fetch_chunk(size, bytes_read);
        debug!(chunk = size, fetched = self.cursor, total = self.paths.len(), "fetched chunk");
        Ok(Some(images))
    }

    fn check_dimensions(&mut self, image: &DecodedImage, path: &str) -> Result<()> {
        let actual = (image.width(), image.height());
        match self.dimensions {
            None => {
                self.dimensions = Some(actual);
                Ok(())
            }
            Some(expected) if expected == actual => Ok(()),
            Some((expected_width, expected_height)) => Err(IngestError::DimensionMismatch {
                path: path.to_string(),
                expected_width,
                expected_height,
                actual_width: actual.0,
                actual_height: actual.1,
            }),
        }
    }

    /// True while images remain to be fetched.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.state == FetchState::Open && self.cursor < self.paths.len()
    }

    #[must_use]
    pub const fn state(&self) -> FetchState {
        self.state
    }

    /// Number of images in the opened fragment.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Size of the most recent chunk.
    #[must_use]
    pub const fn last_chunk_size(&self) -> usize {
        self.last_chunk
    }

    #[must_use]
    pub const fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    #[must_use]
    pub const fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for FetchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchEngine")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("images", &self.paths.len())
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

/// Reads and decodes one image, returning it with the number of bytes read.
fn fetch_one(
    fs: &dyn FileSystem,
    decoder: &dyn ImageDecoder,
    path: &str,
) -> Result<(DecodedImage, u64)> {
    let failed = |reason: String| IngestError::ImageDecodeFailed {
        path: path.to_string(),
        reason,
    };
    let mut stream = fs.open(path).map_err(|e| failed(e.to_string()))?;
    let mut bytes = Vec::new();
    stream
        .read_to_end(&mut bytes)
        .map_err(|e| failed(format!("read: {e}")))?;
    let image = decoder.decode(&bytes).map_err(|e| failed(format!("{e:#}")))?;
    Ok((image, bytes.len() as u64))
}
