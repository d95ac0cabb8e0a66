//! Segment mapping.
//!
//! A segment is the unit of ownership: keys are grouped into a fixed number
//! of segments and owners are assigned per segment, never per key.

/// Index of a segment, in `[0, num_segments)`.
pub type SegmentId = usize;

/// Map a (possibly negative) key hash to a segment.
///
/// Negative hashes are normalized with `unsigned_abs`, so `i32::MIN` maps
/// without overflow.
///
/// # Panics
/// Panics if `num_segments` is 0. Consistent hashes validate that at
/// construction time, so lookups never hit this.
#[inline]
pub fn segment_for_hash(hash: i32, num_segments: usize) -> SegmentId {
    hash.unsigned_abs() as usize % num_segments
}
