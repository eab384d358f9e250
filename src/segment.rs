//! Segment gating: exactly one parallel scan worker owns a fragment.
//!
//! Every worker of a parallel scan receives the same fragment metadata together with its
//! own byte-range split of the file group. Only the worker whose split starts at offset 0
//! materializes the row; all others see an empty fragment and do no I/O.

/// A scan worker's byte-range assignment within a file group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileSplit {
    pub start: u64,
    pub length: u64,
}

impl FileSplit {
    #[must_use]
    pub const fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// The split every file group's owner receives.
    #[must_use]
    pub const fn first() -> Self {
        Self::new(0, 0)
    }
}

/// Decides fragment ownership for one scan worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentGate {
    split: FileSplit,
}

impl SegmentGate {
    #[must_use]
    pub const fn new(split: FileSplit) -> Self {
        Self { split }
    }

    /// True iff this worker's split starts at offset 0.
    #[must_use]
    pub const fn is_owner(&self) -> bool {
        self.split.start == 0
    }

    #[must_use]
    pub const fn split(&self) -> FileSplit {
        self.split
    }
}

impl From<FileSplit> for SegmentGate {
    fn from(split: FileSplit) -> Self {
        Self::new(split)
    }
}
