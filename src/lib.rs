//! # Ironpix
//!
//! Batch **image fragment ingestion** for analytical tables. A fragment is a group of
//! image files that becomes one output row: file paths, file names, parent directories,
//! one-hot directory labels, the pixel-array dimensions and the pixels themselves.
//!
//! ## Quick Start
//!
//! ```
//! use ironpix::config::{AccessorConfig, ColumnTypes, ScanConfig};
//! use ironpix::fields::DataType;
//! use ironpix::scan::ImageAccessor;
//! use ironpix::segment::FileSplit;
//! use ironpix::testing::FragmentFixture;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut fixture = FragmentFixture::new("mem:///animals");
//! fixture.add_solid("cats/1.png", 0, 2, 2, 1, [10, 20, 30])?;
//! fixture.add_solid("dogs/1.png", 1, 2, 2, 1, [40, 50, 60])?;
//!
//! let config = ScanConfig::new(
//!     AccessorConfig { threads: 2, normalize: false },
//!     ColumnTypes::new(DataType::TextArray, DataType::Int8Array, DataType::Int8Array),
//! );
//! let mut accessor = ImageAccessor::new(config, fixture.resolver());
//! assert!(accessor.open_for_read(&fixture.descriptor(), FileSplit::first())?);
//!
//! let mut row = accessor.read_next_row()?.expect("owner produces a row");
//! let mut out = Vec::new();
//! row.images.write_to(&mut out)?;
//! assert_eq!(
//!     String::from_utf8(out)?,
//!     "{{{{10,20,30},{10,20,30}}},{{{40,50,60},{40,50,60}}}}"
//! );
//! assert!(accessor.read_next_row()?.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ## How a row is built
//!
//! 1. [`descriptor::parse_descriptor`] turns the planner's `prefix|path,i/n|...` string
//!    into a [`FragmentRequest`].
//! 2. [`segment::SegmentGate`] lets only the scan worker whose split starts at offset 0
//!    materialize the fragment. Every other worker returns no row without any I/O.
//! 3. [`FetchEngine`] reads and decodes images in chunks of at most `ACCESSOR_THREADS`,
//!    each chunk a fan-out/fan-in over a bounded [`pool::WorkerPool`].
//! 4. [`EncodeEngine`] encodes each fetched chunk into one of three wire forms and hands
//!    the images out one at a time through a [`StreamingField`].
//!
//! Output order always equals descriptor order, across all columns.
//!
//! ## Module Overview
//!
//! - [`descriptor`] - descriptor parsing and rendering
//! - [`segment`] - split ownership
//! - [`storage`] - filesystem contract, local and in-memory filesystems, scheme registry
//! - [`codec`] - decoded pixel buffers and the image decoder
//! - [`pool`] - bounded chunk worker pool
//! - [`fetch`] - the fetch engine
//! - [`encode`] - the encode engine and its encodings
//! - [`fields`] / [`streaming`] - row values and the streaming image field
//! - [`scan`] - one accessor per scan worker
//! - [`config`], [`error`], [`logging`], [`metrics`], [`testing`]

pub mod codec;
pub mod config;
pub mod descriptor;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod fields;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod scan;
pub mod segment;
pub mod storage;
pub mod streaming;
pub mod testing;

pub use codec::{DecodedImage, ImageDecoder, StandardDecoder};
pub use config::{AccessorConfig, ColumnTypes, ScanConfig};
pub use descriptor::{FragmentRequest, ImageDescriptor, parse_descriptor, render_descriptor};
pub use encode::{EncodeEngine, EncodedImage, ImageEncoding, OutputShape};
pub use error::{IngestError, Result};
pub use fetch::{FetchEngine, FetchState};
pub use fields::{DataType, FieldValue, ImageRow, RowMetadata};
pub use metrics::{MetricsSnapshot, ScanMetrics};
pub use scan::{ImageAccessor, scan_fragment};
pub use segment::{FileSplit, SegmentGate};
pub use streaming::{StreamingField, StreamingKind};
