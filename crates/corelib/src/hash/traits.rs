//! Core hash function trait definitions.

use std::fmt::Debug;

/// Maps keys to 32-bit integers for segment placement.
///
/// Implementations are stateless and thread-safe, and must be deterministic
/// across processes: every node of the cluster has to map a key to the same
/// segment.
pub trait HashFunction: Send + Sync + Debug + 'static {
    /// Hash a key.
    ///
    /// The result may be negative; the segment mapper normalizes it.
    fn hash(&self, key: &[u8]) -> i32;

    /// Returns the name of this hash function.
    ///
    /// Two consistent hashes use the same hash function iff the names match.
    fn name(&self) -> &'static str;
}

/// Fold a 64-bit hash into 32 bits, keeping entropy from both halves.
#[inline]
pub(crate) fn fold64(h: u64) -> i32 {
    (h ^ (h >> 32)) as u32 as i32
}
