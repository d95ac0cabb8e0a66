//! SipHash-1-3 hash function.

use crate::hash::traits::{fold64, HashFunction};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// SipHash-1-3 with fixed zero keys, folded to 32 bits.
///
/// The keys are fixed so the mapping is identical on every node.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipHash;

impl HashFunction for SipHash {
    fn hash(&self, key: &[u8]) -> i32 {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        fold64(hasher.finish())
    }

    fn name(&self) -> &'static str {
        "SipHash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sip_deterministic() {
        assert_eq!(SipHash.hash(b"key"), SipHash.hash(b"key"));
        assert_ne!(SipHash.hash(b"key-1"), SipHash.hash(b"key-2"));
    }
}
