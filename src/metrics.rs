//! Counters for one fragment scan.
//!
//! [`ScanMetrics`] is cheap to clone and shared by the fetch and encode engines of a row.
//! Counters are updated from the driving thread after each chunk barrier, so they always
//! describe whole chunks.
//!
//! # Example
//!
//! ```
//! use ironpix::metrics::ScanMetrics;
//!
//! let metrics = ScanMetrics::new();
//! metrics.record_fetch_chunk(2, 4096);
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.images_fetched, 2);
//! assert_eq!(snapshot.fetch_chunks, 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Counters {
    images_fetched: AtomicU64,
    bytes_read: AtomicU64,
    fetch_chunks: AtomicU64,
    images_encoded: AtomicU64,
    bytes_encoded: AtomicU64,
    encode_chunks: AtomicU64,
}

/// Thread-safe counters shared between engines.
#[derive(Debug, Clone, Default)]
pub struct ScanMetrics {
    inner: Arc<Counters>,
}

/// Point-in-time copy of [`ScanMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub images_fetched: u64,
    pub bytes_read: u64,
    pub fetch_chunks: u64,
    pub images_encoded: u64,
    pub bytes_encoded: u64,
    pub encode_chunks: u64,
}

impl ScanMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch_chunk(&self, images: usize, bytes: u64) {
        self.inner
            .images_fetched
            .fetch_add(images as u64, Ordering::Relaxed);
        self.inner.bytes_read.fetch_add(bytes, Ordering::Relaxed);
        self.inner.fetch_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_encode_chunk(&self, images: usize, bytes: u64) {
        self.inner
            .images_encoded
            .fetch_add(images as u64, Ordering::Relaxed);
        self.inner.bytes_encoded.fetch_add(bytes, Ordering::Relaxed);
        self.inner.encode_chunks.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            images_fetched: c.images_fetched.load(Ordering::Relaxed),
            bytes_read: c.bytes_read.load(Ordering::Relaxed),
            fetch_chunks: c.fetch_chunks.load(Ordering::Relaxed),
            images_encoded: c.images_encoded.load(Ordering::Relaxed),
            bytes_encoded: c.bytes_encoded.load(Ordering::Relaxed),
            encode_chunks: c.encode_chunks.load(Ordering::Relaxed),
        }
    }

    /// Snapshot rendered as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Save the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_json()?.as_bytes())?;
        Ok(())
    }
}
