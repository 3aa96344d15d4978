//! Byte-range planning: cut a file of `total_size` bytes into contiguous,
//! inclusive ranges that can be read independently.

use crate::error::PipelineError;
use serde::Serialize;
use std::fmt;

/// Default floor for a range's length when the caller does not set one.
pub const DEFAULT_MIN_BLOCK_SIZE: u64 = 1024;

/// Inclusive byte span `[begin, end]` owned by one range reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ByteRange {
    pub begin: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(begin: u64, end: u64) -> Self {
        debug_assert!(begin <= end);
        Self { begin, end }
    }

    /// Number of bytes covered (always >= 1).
    pub fn len(&self) -> u64 {
        self.end - self.begin + 1
    }

    /// Ranges are never empty; provided for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Range used for streams that cannot be sought (compressed inputs).
    pub fn whole_stream() -> Self {
        Self { begin: 0, end: u64::MAX - 1 }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.begin, self.end)
    }
}

/// Splits byte lengths into at most `split_count` ranges of at least
/// `min_block_size` bytes each (the last range absorbs the remainder).
#[derive(Clone, Copy, Debug)]
pub struct SplitPlanner {
    pub min_block_size: u64,
}

impl Default for SplitPlanner {
    fn default() -> Self {
        Self { min_block_size: DEFAULT_MIN_BLOCK_SIZE }
    }
}

impl SplitPlanner {
    /// A zero `min_block_size` falls back to [`DEFAULT_MIN_BLOCK_SIZE`].
    pub fn new(min_block_size: u64) -> Self {
        let min_block_size = if min_block_size == 0 { DEFAULT_MIN_BLOCK_SIZE } else { min_block_size };
        Self { min_block_size }
    }

    /// Plan the ranges for a file of `total_size` bytes.
    ///
    /// Small files get fewer ranges than requested: the block size never drops
    /// below `min_block_size`, and the walk stops as soon as a range reaches
    /// the last byte.
    pub fn plan(&self, split_count: usize, total_size: u64) -> Result<Vec<ByteRange>, PipelineError> {
        if split_count == 0 {
            return Err(PipelineError::invalid("split count must be > 0"));
        }
        if total_size == 0 {
            return Err(PipelineError::invalid("size must be > 0"));
        }

        let min_block = self.min_block_size.max(1);
        let mut block_size = total_size / split_count as u64;
        if block_size <= min_block {
            block_size = min_block;
        }

        let last_byte = total_size - 1;
        let mut ranges = Vec::with_capacity(split_count.min((total_size / block_size) as usize + 1));
        let mut begin = 0u64;
        for i in 0..split_count {
            if begin >= total_size {
                break;
            }
            let mut end = begin.saturating_add(block_size - 1);
            let is_last = i == split_count - 1;
            if end >= last_byte || is_last {
                end = last_byte;
            }
            ranges.push(ByteRange::new(begin, end));
            if end == last_byte {
                break;
            }
            begin = end + 1;
        }
        Ok(ranges)
    }
}
