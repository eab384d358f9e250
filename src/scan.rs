//! Fragment scan: one accessor per scan worker, at most one row per fragment.
//!
//! [`ImageAccessor`] ties the pieces together: the [`SegmentGate`] decides whether this
//! worker owns the fragment, the [`FetchEngine`] decodes its images, and the
//! [`EncodeEngine`] behind the row's [`StreamingField`] encodes them as the writer pulls.
//!
//! ```no_run
//! use ironpix::config::ScanConfig;
//! use ironpix::scan::ImageAccessor;
//! use ironpix::segment::FileSplit;
//! use ironpix::storage::SchemeRegistry;
//! use std::sync::Arc;
//!
//! let mut accessor = ImageAccessor::new(ScanConfig::default(), Arc::new(SchemeRegistry::default()));
//! if accessor.open_for_read("/data/images|cats/1.png,0/2|dogs/1.png,1/2", FileSplit::first())? {
//!     while let Some(row) = accessor.read_next_row()? {
//!         let mut out = Vec::new();
//!         let mut images = row.images;
//!         images.write_to(&mut out)?;
//!     }
//! }
//! # Ok::<(), ironpix::IngestError>(())
//! ```

use crate::codec::{ImageDecoder, StandardDecoder};
use crate::config::ScanConfig;
use crate::descriptor::{FragmentRequest, parse_descriptor};
use crate::encode::{EncodeEngine, OutputShape};
use crate::error::Result;
use crate::fetch::FetchEngine;
use crate::fields::ImageRow;
use crate::metrics::ScanMetrics;
use crate::pool::WorkerPool;
use crate::segment::{FileSplit, SegmentGate};
use crate::storage::FileSystemResolver;
use crate::streaming::StreamingField;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ImageAccessor {
    config: ScanConfig,
    resolver: Arc<dyn FileSystemResolver>,
    decoder: Arc<dyn ImageDecoder>,
    metrics: ScanMetrics,
    request: Option<FragmentRequest>,
    fetch: Option<FetchEngine>,
}

impl ImageAccessor {
    /// An accessor that decodes with [`StandardDecoder`].
    #[must_use]
    pub fn new(config: ScanConfig, resolver: Arc<dyn FileSystemResolver>) -> Self {
        Self {
            config,
            resolver,
            decoder: Arc::new(StandardDecoder),
            metrics: ScanMetrics::new(),
            request: None,
            fetch: None,
        }
    }

    #[must_use]
    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Counters shared by every engine this accessor builds.
    #[must_use]
    pub const fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    /// Prepares the fragment described by `data_source` for reading.
    ///
    /// Returns `Ok(false)` when `split` does not own the fragment or the fragment has no
    /// images; the descriptor is not even parsed in the first case. A later
    /// [`ImageAccessor::read_next_row`] then yields nothing.
    ///
    /// # Errors
    ///
    /// - [`crate::IngestError::MalformedDescriptor`] if the descriptor cannot be parsed
    /// - [`crate::IngestError::WorkerPool`] if the worker pool cannot be built
    /// - [`crate::IngestError::FilesystemUnavailable`] if no filesystem serves the paths
    pub fn open_for_read(&mut self, data_source: &str, split: FileSplit) -> Result<bool> {
        self.request = None;
        self.fetch = None;

        let gate = SegmentGate::new(split);
        if !gate.is_owner() {
            debug!(split_start = split.start, "segment does not own fragment");
            return Ok(false);
        }
        let request = parse_descriptor(data_source)?;
        if request.is_empty() {
            debug!(prefix = request.prefix(), "fragment has no images");
            return Ok(false);
        }

        let pool = WorkerPool::new(self.config.accessor.threads)?;
        let mut fetch = FetchEngine::new(pool, Arc::clone(&self.decoder), self.metrics.clone());
        if !fetch.open(&request, &gate, self.resolver.as_ref())? {
            return Ok(false);
        }
        self.request = Some(request);
        self.fetch = Some(fetch);
        Ok(true)
    }

    /// Returns the fragment's row once, then `None` forever.
    ///
    /// # Errors
    ///
    /// Any error of [`EncodeEngine::prepare`]; no row is produced in that case.
    pub fn read_next_row(&mut self) -> Result<Option<ImageRow>> {
        let (Some(fetch), Some(request)) = (self.fetch.take(), self.request.take()) else {
            return Ok(None);
        };
        let shape = OutputShape::negotiate(&self.config.columns, self.config.accessor.normalize);
        let (engine, metadata) = EncodeEngine::prepare(fetch, &request, shape)?;
        info!(
            prefix = request.prefix(),
            images = request.len(),
            width = engine.width(),
            height = engine.height(),
            encoding = ?shape.encoding(),
            "fragment row ready"
        );
        Ok(Some(ImageRow {
            metadata,
            images: StreamingField::new(engine, self.config.columns.image),
        }))
    }

    /// True between a successful [`ImageAccessor::open_for_read`] and the row being read.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.fetch.is_some()
    }
}

impl std::fmt::Debug for ImageAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAccessor")
            .field("config", &self.config)
            .field("request", &self.request)
            .field("fetch", &self.fetch)
            .finish_non_exhaustive()
    }
}

/// Scans one fragment with a fresh accessor, returning its row if `split` owns it.
///
/// # Errors
///
/// Any error of [`ImageAccessor::open_for_read`] or [`ImageAccessor::read_next_row`].
pub fn scan_fragment(
    config: ScanConfig,
    resolver: Arc<dyn FileSystemResolver>,
    data_source: &str,
    split: FileSplit,
) -> Result<Option<ImageRow>> {
    let mut accessor = ImageAccessor::new(config, resolver);
    if !accessor.open_for_read(data_source, split)? {
        return Ok(None);
    }
    accessor.read_next_row()
}
