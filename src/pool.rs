//! Bounded fan-out/fan-in worker pool.
//!
//! A [`WorkerPool`] runs one chunk of work at a time: [`WorkerPool::run_chunk`] hands each
//! item to a worker, blocks until every item has finished, and returns the results in
//! item order regardless of completion order. The pool never holds more than
//! [`WorkerPool::threads`] workers, so a chunk is sized `min(threads, remaining)` by
//! its callers.

use crate::error::Result;
#[cfg(feature = "parallel-io")]
use rayon::prelude::*;
#[cfg(feature = "parallel-io")]
use std::sync::Arc;

#[derive(Clone)]
pub struct WorkerPool {
    threads: usize,
    #[cfg(feature = "parallel-io")]
    pool: Arc<rayon::ThreadPool>,
}

impl WorkerPool {
    /// Builds a pool of `threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`crate::IngestError::WorkerPool`] if the threads cannot be spawned.
    #[cfg(feature = "parallel-io")]
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("ironpix-worker-{i}"))
            .build()?;
        Ok(Self {
            threads,
            pool: Arc::new(pool),
        })
    }

    /// Builds a sequential pool; chunks still use `threads` as their size.
    ///
    /// # Errors
    ///
    /// Never fails without the `parallel-io` feature.
    #[cfg(not(feature = "parallel-io"))]
    pub fn new(threads: usize) -> Result<Self> {
        Ok(Self {
            threads: threads.max(1),
        })
    }

    #[must_use]
    pub const fn threads(&self) -> usize {
        self.threads
    }

    /// Size of the next chunk when `remaining` items are left.
    #[must_use]
    pub fn chunk_size(&self, remaining: usize) -> usize {
        self.threads.min(remaining)
    }

    /// Runs `f` over every item and joins.
    ///
    /// Each result lands in its item's slot. Every item runs to completion even when a
    /// sibling fails; callers decide how to fold the per-item results.
    #[cfg(feature = "parallel-io")]
    pub fn run_chunk<I, T, F>(&self, items: Vec<I>, f: F) -> Vec<T>
    where
        I: Send,
        T: Send,
        F: Fn(usize, I) -> T + Send + Sync,
    {
        self.pool.install(|| {
            items
                .into_par_iter()
                .enumerate()
                .map(|(slot, item)| f(slot, item))
                .collect()
        })
    }

    #[cfg(not(feature = "parallel-io"))]
    pub fn run_chunk<I, T, F>(&self, items: Vec<I>, f: F) -> Vec<T>
    where
        I: Send,
        T: Send,
        F: Fn(usize, I) -> T + Send + Sync,
    {
        items
            .into_iter()
            .enumerate()
            .map(|(slot, item)| f(slot, item))
            .collect()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish_non_exhaustive()
    }
}
