//! Test fixtures and assertions for image fragments.
//!
//! Everything here builds real encoded images through the `image` crate, so tests exercise
//! the same decode path a production scan does.
//!
//! - [`png_bytes`] / [`solid_png`]: synthetic PNG files
//! - [`FragmentFixture`]: an in-memory fragment plus its descriptor string and resolver
//! - [`write_png_tree`]: the same images written to a temporary directory on disk
//! - assertions for one-hot labels, bitmaps and row alignment
//!
//! # Example
//!
//! ```
//! use ironpix::config::ScanConfig;
//! use ironpix::scan::scan_fragment;
//! use ironpix::segment::FileSplit;
//! use ironpix::testing::FragmentFixture;
//!
//! let mut fixture = FragmentFixture::new("mem:///photos");
//! fixture.add_solid("cats/a.png", 0, 2, 2, 2, [255, 0, 0])?;
//! fixture.add_solid("dogs/b.png", 1, 2, 2, 2, [0, 0, 255])?;
//!
//! let row = scan_fragment(
//!     ScanConfig::default(),
//!     fixture.resolver(),
//!     &fixture.descriptor(),
//!     FileSplit::first(),
//! )?
//! .expect("the first split owns the fragment");
//! assert_eq!(row.image_count(), 2);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
