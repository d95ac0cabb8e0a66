//! Human-readable routing table view of a consistent hash.
//!
//! This is a presentation format for operators and tooling, not a
//! replication format: it cannot be turned back into a `ConsistentHash`.

use crate::ch::ConsistentHash;
use crate::node::NodeId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-node ownership counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OwnershipSummary {
    pub primary: usize,
    pub total: usize,
}

/// Serializable snapshot of a consistent hash with display names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoutingTable {
    pub hash: String,
    pub num_owners: usize,
    pub num_segments: usize,
    pub members: Vec<String>,
    /// Owner names per segment, primary first.
    pub segments: Vec<Vec<String>>,
    /// Ownership counts keyed by member name.
    pub ownership: BTreeMap<String, OwnershipSummary>,
}

impl RoutingTable {
    /// Render `ch`, naming nodes with `name_of`.
    pub fn new(ch: &ConsistentHash, name_of: impl Fn(&NodeId) -> String) -> Self {
        let mut ownership: BTreeMap<String, OwnershipSummary> = ch
            .members()
            .iter()
            .map(|node| {
                (
                    name_of(node),
                    OwnershipSummary {
                        primary: 0,
                        total: 0,
                    },
                )
            })
            .collect();

        let mut segments = Vec::with_capacity(ch.num_segments());
        for (_, owners) in ch.segments() {
            let names: Vec<String> = owners.iter().map(&name_of).collect();
            for (i, name) in names.iter().enumerate() {
                if let Some(summary) = ownership.get_mut(name) {
                    summary.total += 1;
                    if i == 0 {
                        summary.primary += 1;
                    }
                }
            }
            segments.push(names);
        }

        Self {
            hash: ch.hash_function().name().to_string(),
            num_owners: ch.num_owners(),
            num_segments: ch.num_segments(),
            members: ch.members().iter().map(&name_of).collect(),
            segments,
            ownership,
        }
    }
}

impl ConsistentHash {
    /// Routing table view using hex node ids as names.
    pub fn to_routing_table(&self) -> RoutingTable {
        RoutingTable::new(self, NodeId::to_string)
    }
}
