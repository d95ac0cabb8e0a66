//! Consistent hash configuration.

use crate::error::{Error, Result};
use crate::hash::HashKind;
use serde::{Deserialize, Serialize};

/// Default replication factor.
pub const DEFAULT_NUM_OWNERS: usize = 2;
/// Default number of segments.
pub const DEFAULT_NUM_SEGMENTS: usize = 256;

/// Parameters that shape a consistent hash.
///
/// The member list is not part of the configuration: it comes from the
/// membership view at the time the consistent hash is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashConfig {
    /// Requested number of owners (primary + backups) per segment.
    pub num_owners: usize,
    /// Number of segments the key space is split into.
    pub num_segments: usize,
    /// Hash function used to map keys to segments.
    pub hash: HashKind,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            num_owners: DEFAULT_NUM_OWNERS,
            num_segments: DEFAULT_NUM_SEGMENTS,
            hash: HashKind::default(),
        }
    }
}

impl HashConfig {
    /// Check the member-independent constraints.
    ///
    /// `num_segments >= |members|` can only be checked once the members are
    /// known, so the factory checks it again at creation.
    pub fn validate(&self) -> Result<()> {
        if self.num_owners == 0 {
            return Err(Error::config("the number of owners should be greater than 0"));
        }
        if self.num_segments == 0 {
            return Err(Error::config("the number of segments should be greater than 0"));
        }
        Ok(())
    }
}
