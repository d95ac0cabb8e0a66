//! Node abstractions for segment ownership.
//!
//! Nodes represent cluster members that can own segments. They are identified
//! by a compact `NodeId` that is cheap to compare and hash. Seniority (which
//! node is "older") is never derived from the id: it is the node's position in
//! the member list handed to the factory.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_128;

/// Compact identifier for a node in the cluster.
///
/// Newtype over `u128` so comparisons and hashing are very fast while giving
/// plenty of space for uniqueness.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u128);

impl NodeId {
    /// Derive a node id from a human-readable name.
    ///
    /// Uses xxh3-128, which is seedless and platform independent, so every
    /// process derives the same id for the same name.
    pub fn from_name(name: &str) -> Self {
        NodeId(xxh3_128(name.as_bytes()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Logical cluster member.
///
/// Keep this struct small and cheap to clone; membership state (liveness,
/// join time, ...) belongs to the membership view provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Human‑readable name or hostname.
    pub name: String,
}

impl Node {
    /// Construct a new node with basic metadata.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Construct a node whose id is derived from its name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: NodeId::from_name(&name),
            name,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
