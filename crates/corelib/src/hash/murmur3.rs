//! MurmurHash3 (x86, 32-bit) hash function.

use crate::hash::traits::HashFunction;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;

/// MurmurHash3 x86_32 with seed 0.
///
/// This is the default hash function: fast, well distributed, and trivially
/// reproducible in other languages.
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3Hash;

impl HashFunction for Murmur3Hash {
    fn hash(&self, key: &[u8]) -> i32 {
        murmur3_32(key, 0) as i32
    }

    fn name(&self) -> &'static str {
        "Murmur3Hash"
    }
}

#[inline]
fn mix_k1(mut k: u32) -> u32 {
    k = k.wrapping_mul(C1);
    k = k.rotate_left(15);
    k.wrapping_mul(C2)
}

/// MurmurHash3 x86_32 over `data` with the given seed.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let len = data.len();
    let mut h = seed;

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        h ^= mix_k1(k);
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = chunks.remainder();
    let mut k1: u32 = 0;
    if tail.len() >= 3 {
        k1 ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        k1 ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        k1 ^= tail[0] as u32;
        h ^= mix_k1(k1);
    }

    // Finalization
    h ^= len as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}
