//! Hash function adapters.
//!
//! A hash function turns an arbitrary key into a 32-bit integer. The
//! consistent hash only ever reduces that integer modulo the number of
//! segments, so adapters carry no state and are freely shareable.

pub mod murmur3;
pub mod sip;
pub mod traits;
pub mod xxh3;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use murmur3::Murmur3Hash;
pub use sip::SipHash;
pub use traits::HashFunction;
pub use xxh3::Xxh3Hash;

/// Configuration-level selector for a hash function.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashKind {
    #[default]
    Murmur3,
    Sip,
    Xxh3,
}

impl HashKind {
    /// Instantiate the selected hash function.
    pub fn build(self) -> Arc<dyn HashFunction> {
        match self {
            HashKind::Murmur3 => Arc::new(Murmur3Hash),
            HashKind::Sip => Arc::new(SipHash),
            HashKind::Xxh3 => Arc::new(Xxh3Hash),
        }
    }
}
