//! Encode engine: turns decoded images into wire values, one image at a time.
//!
//! An [`EncodeEngine`] owns the [`FetchEngine`] it drains. [`EncodeEngine::prepare`] pulls
//! the first fetch chunk eagerly to learn the image size and build the row's metadata
//! columns. After that, each time the queue of encoded images runs dry,
//! [`EncodeEngine::next_image`] encodes the whole pending fetch chunk concurrently, waits
//! for every worker, then asks the fetch engine for the chunk after it. Encode chunks are
//! therefore always exactly the fetch chunks, and results are queued in descriptor order.
//!
//! Three encodings exist, chosen once per row by [`OutputShape`]:
//!
//! | image column | `normalize` | encoding |
//! |---|---|---|
//! | numeric array | off | [`EncodedImage::TextArrayLiteral`] with `0..=255` integers |
//! | numeric array | on | [`EncodedImage::TextArrayLiteral`] with `v / 255.0` floats |
//! | binary | off | [`EncodedImage::RawByteBitmap`] |
//! | binary | on | [`EncodedImage::NormalizedFloatBitmap`] |

pub mod bitmap;
pub mod literal;
pub mod metadata;

use crate::codec::DecodedImage;
use crate::config::ColumnTypes;
use crate::descriptor::FragmentRequest;
use crate::error::{IngestError, Result};
use crate::fetch::FetchEngine;
use crate::fields::{DataType, RowMetadata};
use crate::metrics::ScanMetrics;
use crate::pool::WorkerPool;
use bitmap::{CHANNELS, FLOAT_BYTES, encode_normalized, encode_raw};
use literal::LiteralTable;
use metadata::build_metadata;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// How one row is laid out, fixed for the row's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputShape {
    /// One image per row (text metadata columns) rather than an array of images.
    pub scalar_mode: bool,
    pub labels_as_bytes: bool,
    pub pixels_as_bytes: bool,
    pub normalize: bool,
}

impl OutputShape {
    /// Derives the shape from the negotiated column types.
    #[must_use]
    pub fn negotiate(columns: &ColumnTypes, normalize: bool) -> Self {
        Self {
            scalar_mode: columns.full_path == DataType::Text,
            labels_as_bytes: columns.one_hot == DataType::Bytea,
            pixels_as_bytes: columns.image == DataType::Bytea,
            normalize,
        }
    }

    #[must_use]
    pub const fn encoding(&self) -> ImageEncoding {
        match (self.pixels_as_bytes, self.normalize) {
            (false, _) => ImageEncoding::TextArrayLiteral,
            (true, false) => ImageEncoding::RawByteBitmap,
            (true, true) => ImageEncoding::NormalizedFloatBitmap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    TextArrayLiteral,
    RawByteBitmap,
    NormalizedFloatBitmap,
}

/// One encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedImage {
    /// Image body of a nested numeric array literal (see [`literal`]).
    TextArrayLiteral(String),
    /// `width * height * 3` channel bytes.
    RawByteBitmap(Vec<u8>),
    /// `width * height * 3 * 4` big-endian `f32` bytes.
    NormalizedFloatBitmap(Vec<u8>),
}

impl EncodedImage {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::TextArrayLiteral(s) => s.as_bytes(),
            Self::RawByteBitmap(b) | Self::NormalizedFloatBitmap(b) => b,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    #[must_use]
    pub const fn encoding(&self) -> ImageEncoding {
        match self {
            Self::TextArrayLiteral(_) => ImageEncoding::TextArrayLiteral,
            Self::RawByteBitmap(_) => ImageEncoding::RawByteBitmap,
            Self::NormalizedFloatBitmap(_) => ImageEncoding::NormalizedFloatBitmap,
        }
    }
}

pub struct EncodeEngine {
    fetch: FetchEngine,
    pool: WorkerPool,
    metrics: ScanMetrics,
    shape: OutputShape,
    table: Arc<LiteralTable>,
    width: u32,
    height: u32,
    total: usize,
    produced: usize,
    pending: Option<Vec<DecodedImage>>,
    ready: VecDeque<EncodedImage>,
    failed: bool,
}

impl EncodeEngine {
    /// Pulls the first fetch chunk and builds the row's metadata columns.
    ///
    /// `fetch` must already be open on `request`.
    ///
    /// # Errors
    ///
    /// - [`IngestError::EmptyFragment`] if `request` has no descriptors
    /// - [`IngestError::NoDecodedImages`] if the first fetch chunk is empty or missing
    /// - [`IngestError::Config`] if a scalar row is asked to carry several images
    /// - any error of [`FetchEngine::next_chunk`]
    pub fn prepare(
        mut fetch: FetchEngine,
        request: &FragmentRequest,
        shape: OutputShape,
    ) -> Result<(Self, RowMetadata)> {
        if request.is_empty() {
            return Err(IngestError::EmptyFragment);
        }
        if shape.scalar_mode && request.len() > 1 {
            return Err(IngestError::config(
                "columns",
                format!(
                    "scalar columns hold one image but the fragment has {}",
                    request.len()
                ),
            ));
        }
        let first = match fetch.next_chunk()? {
            Some(chunk) if !chunk.is_empty() => chunk,
            _ => return Err(IngestError::NoDecodedImages),
        };
        let (width, height) = (first[0].width(), first[0].height());
        debug!(width, height, encoding = ?shape.encoding(), "image size");

        let metadata = build_metadata(request, &shape, width, height);
        let engine = Self {
            pool: fetch.pool().clone(),
            metrics: fetch.metrics().clone(),
            fetch,
            shape,
            table: Arc::new(LiteralTable::new(shape.normalize)),
            width,
            height,
            total: request.len(),
            produced: 0,
            pending: Some(first),
            ready: VecDeque::new(),
            failed: false,
        };
        Ok((engine, metadata))
    }

    /// True while fewer images have been produced than the fragment holds and no error
    /// has aborted the row.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        !self.failed && self.produced < self.total
    }

    /// Images still to be returned; zero once the row is aborted.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        if self.failed { 0 } else { self.total - self.produced }
    }

    /// True once an error has aborted the row.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns the next encoded image in descriptor order.
    ///
    /// The first error aborts the row: buffered images are dropped and every later call
    /// returns [`IngestError::StreamExhausted`].
    ///
    /// # Errors
    ///
    /// - [`IngestError::StreamExhausted`] once every image has been returned, or after an
    ///   earlier error
    /// - [`IngestError::EncodeFailed`] if an encode worker fails
    /// - any error of [`FetchEngine::next_chunk`] while pulling the following chunk
    pub fn next_image(&mut self) -> Result<EncodedImage> {
        if !self.has_next() {
            return Err(IngestError::StreamExhausted);
        }
        match self.advance() {
            Ok(image) => {
                self.produced += 1;
                Ok(image)
            }
            Err(err) => {
                self.failed = true;
                self.ready.clear();
                self.pending = None;
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<EncodedImage> {
        if self.ready.is_empty() {
            let chunk = self.pending.take().ok_or_else(|| IngestError::EncodeFailed {
                index: self.produced,
                reason: "no decoded image is pending".to_string(),
            })?;
            let encoded = self.encode_chunk(chunk)?;
            self.ready.extend(encoded);
            self.pending = self.fetch.next_chunk()?;
        }
        self.ready.pop_front().ok_or_else(|| IngestError::EncodeFailed {
            index: self.produced,
            reason: "encoded chunk is empty".to_string(),
        })
    }

    fn encode_chunk(&self, chunk: Vec<DecodedImage>) -> Result<Vec<EncodedImage>> {
        let started = Instant::now();
        let base = self.produced;
        let size = chunk.len();
        let shape = self.shape;
        let table = Arc::clone(&self.table);
        let (width, height) = (self.width, self.height);

        let results = self.pool.run_chunk(chunk, |slot, image| {
            encode_one(&image, &shape, &table, width, height).map_err(|reason| {
                IngestError::EncodeFailed {
                    index: base + slot,
                    reason,
                }
            })
        });
        let encoded = results.into_iter().collect::<Result<Vec<_>>>()?;

        let bytes: u64 = encoded.iter().map(|e| e.len() as u64).sum();
        self.metrics.record_encode_chunk(size, bytes);
        debug!(
            chunk = size,
            bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "encoded chunk"
        );
        Ok(encoded)
    }

    #[must_use]
    pub const fn shape(&self) -> OutputShape {
        self.shape
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of images in the fragment.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Number of images returned so far.
    #[must_use]
    pub const fn produced(&self) -> usize {
        self.produced
    }

    #[must_use]
    pub const fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for EncodeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodeEngine")
            .field("shape", &self.shape)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("produced", &self.produced)
            .field("total", &self.total)
            .field("failed", &self.failed)
            .field("fetch", &self.fetch)
            .finish_non_exhaustive()
    }
}

fn encode_one(
    image: &DecodedImage,
    shape: &OutputShape,
    table: &LiteralTable,
    width: u32,
    height: u32,
) -> std::result::Result<EncodedImage, String> {
    if image.width() != width || image.height() != height {
        return Err(format!(
            "image is {}x{}, row is {width}x{height}",
            image.width(),
            image.height()
        ));
    }
    let encoded = match shape.encoding() {
        ImageEncoding::TextArrayLiteral => EncodedImage::TextArrayLiteral(table.encode(image)),
        ImageEncoding::RawByteBitmap => EncodedImage::RawByteBitmap(encode_raw(image)),
        ImageEncoding::NormalizedFloatBitmap => {
            EncodedImage::NormalizedFloatBitmap(encode_normalized(image))
        }
    };
    let pixels = width as usize * height as usize;
    let expected = match encoded.encoding() {
        ImageEncoding::TextArrayLiteral => None,
        ImageEncoding::RawByteBitmap => Some(pixels * CHANNELS),
        ImageEncoding::NormalizedFloatBitmap => Some(pixels * CHANNELS * FLOAT_BYTES),
    };
    match expected {
        Some(len) if len != encoded.len() => {
            Err(format!("encoded {} bytes, expected {len}", encoded.len()))
        }
        _ => Ok(encoded),
    }
}
