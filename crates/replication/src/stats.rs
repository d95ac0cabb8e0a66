//! Ownership statistics.
//!
//! Counts how many segments each node primary-owns and owns in total. A
//! tracker lives for exactly one factory call: it is built from a consistent
//! hash, mutated as owners move, and dropped. Nodes are addressed by their
//! index in the member list the tracker was built for, so counts are plain
//! vector slots.

use corelib::{ConsistentHash, Error, NodeId, Result};
use std::collections::HashMap;

/// Per-node primary and total segment counts.
#[derive(Debug, Clone)]
pub struct OwnershipStatistics {
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    primary_owned: Vec<usize>,
    owned: Vec<usize>,
}

impl OwnershipStatistics {
    /// Zeroed statistics for `nodes`.
    pub fn new(nodes: &[NodeId]) -> Self {
        Self {
            nodes: nodes.to_vec(),
            index: nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect(),
            primary_owned: vec![0; nodes.len()],
            owned: vec![0; nodes.len()],
        }
    }

    /// Statistics of `ch`, restricted to `nodes`.
    ///
    /// Owners that are not in `nodes` (leavers) are ignored, including when
    /// they are the primary owner of a segment.
    pub fn from_hash(ch: &ConsistentHash, nodes: &[NodeId]) -> Self {
        let mut stats = Self::new(nodes);
        for (_, owners) in ch.segments() {
            for (position, owner) in owners.iter().enumerate() {
                if let Some(i) = stats.index_of(owner) {
                    if position == 0 {
                        stats.inc_primary_owned(i);
                    }
                    stats.inc_owned(i);
                }
            }
        }
        stats
    }

    /// Tracked nodes, in index order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Index of a tracked node.
    pub fn index_of(&self, node: &NodeId) -> Option<usize> {
        self.index.get(node).copied()
    }

    /// Index of a node that must be tracked.
    ///
    /// # Errors
    /// [`Error::UnknownNode`] if the node is not tracked: a zero count and an
    /// untracked node are different things.
    pub fn require_index(&self, node: &NodeId) -> Result<usize> {
        self.index_of(node).ok_or(Error::UnknownNode(*node))
    }

    /// Number of segments `node` primary-owns.
    pub fn primary_owned_by(&self, node: &NodeId) -> Result<usize> {
        Ok(self.primary_owned[self.require_index(node)?])
    }

    /// Number of segments `node` owns, as primary or backup.
    pub fn owned_by(&self, node: &NodeId) -> Result<usize> {
        Ok(self.owned[self.require_index(node)?])
    }

    // Index-based accessors. Indices come from `index_of`/`require_index`
    // or from iterating the member list the statistics were built for.

    #[inline]
    pub fn primary_owned(&self, i: usize) -> usize {
        self.primary_owned[i]
    }

    #[inline]
    pub fn owned(&self, i: usize) -> usize {
        self.owned[i]
    }

    #[inline]
    pub fn inc_primary_owned(&mut self, i: usize) {
        self.primary_owned[i] += 1;
    }

    #[inline]
    pub fn dec_primary_owned(&mut self, i: usize) {
        debug_assert!(self.primary_owned[i] > 0, "primary count underflow for {}", self.nodes[i]);
        self.primary_owned[i] = self.primary_owned[i].saturating_sub(1);
    }

    #[inline]
    pub fn inc_owned(&mut self, i: usize) {
        self.owned[i] += 1;
    }

    #[inline]
    pub fn dec_owned(&mut self, i: usize) {
        debug_assert!(self.owned[i] > 0, "owned count underflow for {}", self.nodes[i]);
        self.owned[i] = self.owned[i].saturating_sub(1);
    }

    /// Sum of all primary-owned counts.
    pub fn total_primary_owned(&self) -> usize {
        self.primary_owned.iter().sum()
    }

    /// Sum of all owned counts.
    pub fn total_owned(&self) -> usize {
        self.owned.iter().sum()
    }
}
