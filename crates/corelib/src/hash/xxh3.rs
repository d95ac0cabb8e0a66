//! XXH3 hash function.

use crate::hash::traits::{fold64, HashFunction};
use xxhash_rust::xxh3::xxh3_64;

/// XXH3-64 folded to 32 bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Hash;

impl HashFunction for Xxh3Hash {
    fn hash(&self, key: &[u8]) -> i32 {
        fold64(xxh3_64(key))
    }

    fn name(&self) -> &'static str {
        "Xxh3Hash"
    }
}
