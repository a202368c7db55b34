//! Fixed-size range planning
//!
//! A file of `total` bytes is cut into ranges of `max_chunk_size` bytes; only
//! the last range may be shorter. An empty file yields no ranges, so no
//! container is ever written for it.

use std::num::NonZeroU64;

use roe_core::ByteRange;

/// Split `[0, total_size)` into contiguous ranges of at most `max_chunk_size` bytes.
pub fn plan_ranges(total_size: u64, max_chunk_size: NonZeroU64) -> Vec<ByteRange> {
    let step = max_chunk_size.get();
    let mut ranges = Vec::with_capacity(total_size.div_ceil(step) as usize);
    let mut offset = 0u64;

    while offset < total_size {
        let length = step.min(total_size - offset);
        ranges.push(ByteRange {
            offset,
            length,
            index: ranges.len(),
        });
        offset += length;
    }

    tracing::debug!(total_size, step, ranges = ranges.len(), "planned byte ranges");
    ranges
}
