//! The consistent hash snapshot.
//!
//! # Layout
//!
//! ```text
//! segment_owners: [ [A, B], [B, C], [C, A], ... ]   one entry per segment
//!                    ^ primary owner, then backups
//! members:        [ A, B, C ]                        oldest member first
//! ```
//!
//! # Invariants
//!
//! - Every segment has at least one owner.
//! - Owners of a segment are distinct and are all members.
//! - `num_segments >= members.len()`.
//!
//! Owner lists are normally at most `min(num_owners, members.len())` long,
//! but the constructor does not enforce that upper bound: a merged hash or
//! the intermediate result of an add-only rebalance carries extra owners on
//! purpose.
//!
//! # Performance
//!
//! - `segment_for` / `owners`: O(1) after hashing the key
//! - `all_owners`: O(k + s * r) for k keys touching s distinct segments
//! - `segments_for_owner`: O(segments * owners)

use crate::error::{Error, Result};
use crate::hash::HashFunction;
use crate::node::NodeId;
use crate::segment::{segment_for_hash, SegmentId};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

/// Immutable mapping from segments to their ordered owner lists.
///
/// Cheap to share behind an `Arc`; factories return the same `Arc` when an
/// operation changes nothing, so `Arc::ptr_eq` is a valid fast path. It is
/// not the definition of equality: use `==` for that.
#[derive(Clone, Debug)]
pub struct ConsistentHash {
    hash_function: Arc<dyn HashFunction>,
    num_owners: usize,
    num_segments: usize,
    members: Box<[NodeId]>,
    segment_owners: Box<[Box<[NodeId]>]>,
}

impl ConsistentHash {
    /// Build a consistent hash from explicit owner lists.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `num_owners` or `num_segments` is 0, the
    /// member list is empty or has duplicates, there are fewer segments than
    /// members, the number of owner lists differs from `num_segments`, or an
    /// owner list is empty, has duplicates, or names a non-member.
    pub fn new(
        hash_function: Arc<dyn HashFunction>,
        num_owners: usize,
        num_segments: usize,
        members: Vec<NodeId>,
        segment_owners: Vec<Vec<NodeId>>,
    ) -> Result<Self> {
        if num_owners == 0 {
            return Err(Error::config("the number of owners should be greater than 0"));
        }
        if num_segments == 0 {
            return Err(Error::config("the number of segments should be greater than 0"));
        }
        if members.is_empty() {
            return Err(Error::config("the member list should not be empty"));
        }
        if num_segments < members.len() {
            return Err(Error::config(format!(
                "the number of segments ({}) should be at least the number of members ({})",
                num_segments,
                members.len()
            )));
        }
        let member_set: HashSet<NodeId> = members.iter().copied().collect();
        if member_set.len() != members.len() {
            return Err(Error::config("the member list contains duplicates"));
        }
        if segment_owners.len() != num_segments {
            return Err(Error::config(format!(
                "expected {} owner lists, got {}",
                num_segments,
                segment_owners.len()
            )));
        }

        for (segment, owners) in segment_owners.iter().enumerate() {
            if owners.is_empty() {
                return Err(Error::config(format!("segment {} has no owners", segment)));
            }
            for (i, owner) in owners.iter().enumerate() {
                if !member_set.contains(owner) {
                    return Err(Error::config(format!(
                        "owner {} of segment {} is not a member",
                        owner, segment
                    )));
                }
                if owners[..i].contains(owner) {
                    return Err(Error::config(format!(
                        "owner {} appears twice in segment {}",
                        owner, segment
                    )));
                }
            }
        }

        Ok(Self {
            hash_function,
            num_owners,
            num_segments,
            members: members.into_boxed_slice(),
            segment_owners: segment_owners
                .into_iter()
                .map(Vec::into_boxed_slice)
                .collect(),
        })
    }

    /// The hash function used to map keys to segments.
    pub fn hash_function(&self) -> &Arc<dyn HashFunction> {
        &self.hash_function
    }

    /// Requested number of owners per segment.
    ///
    /// Segments have fewer owners when there are fewer members than that.
    pub fn num_owners(&self) -> usize {
        self.num_owners
    }

    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    /// Members, oldest first.
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// True if `node` is in the member list.
    pub fn is_member(&self, node: &NodeId) -> bool {
        self.members.contains(node)
    }

    /// `min(num_owners, members.len())`.
    pub fn actual_num_owners(&self) -> usize {
        self.num_owners.min(self.members.len())
    }

    /// Segment a key belongs to.
    ///
    /// Depends only on the key, the hash function and the segment count,
    /// never on membership.
    #[inline]
    pub fn segment_for(&self, key: &[u8]) -> SegmentId {
        segment_for_hash(self.hash_function.hash(key), self.num_segments)
    }

    /// Owners of a segment, primary first.
    ///
    /// # Panics
    /// Panics if `segment >= num_segments`.
    #[inline]
    pub fn owners_for_segment(&self, segment: SegmentId) -> &[NodeId] {
        &self.segment_owners[segment]
    }

    /// Primary owner of a segment.
    ///
    /// # Panics
    /// Panics if `segment >= num_segments`.
    #[inline]
    pub fn primary_owner_for_segment(&self, segment: SegmentId) -> NodeId {
        // Owner lists are validated non-empty at construction.
        self.segment_owners[segment][0]
    }

    /// Backup owners of a segment (everything after the primary).
    pub fn backup_owners_for_segment(&self, segment: SegmentId) -> &[NodeId] {
        &self.segment_owners[segment][1..]
    }

    /// Owners of the segment `key` maps to, primary first.
    pub fn owners(&self, key: &[u8]) -> &[NodeId] {
        self.owners_for_segment(self.segment_for(key))
    }

    /// Primary owner of the segment `key` maps to.
    pub fn primary_owner(&self, key: &[u8]) -> NodeId {
        self.primary_owner_for_segment(self.segment_for(key))
    }

    /// Union of the owners of every key.
    ///
    /// Keys are first reduced to their distinct segments, so owner lists are
    /// only scanned once per segment no matter how many keys share it.
    pub fn all_owners<I, K>(&self, keys: I) -> HashSet<NodeId>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let segments: HashSet<SegmentId> = keys
            .into_iter()
            .map(|key| self.segment_for(key.as_ref()))
            .collect();

        let mut owners = HashSet::with_capacity(segments.len() * self.num_owners);
        for segment in segments {
            owners.extend(self.owners_for_segment(segment).iter().copied());
        }
        owners
    }

    /// True if `node` owns (as primary or backup) the segment of `key`.
    pub fn is_local(&self, node: &NodeId, key: &[u8]) -> bool {
        self.owners(key).contains(node)
    }

    /// Segments `node` owns, as primary or backup.
    pub fn segments_for_owner(&self, node: &NodeId) -> BTreeSet<SegmentId> {
        self.segment_owners
            .iter()
            .enumerate()
            .filter(|(_, owners)| owners.contains(node))
            .map(|(segment, _)| segment)
            .collect()
    }

    /// Segments `node` is the primary owner of.
    pub fn primary_segments_for_owner(&self, node: &NodeId) -> BTreeSet<SegmentId> {
        self.segment_owners
            .iter()
            .enumerate()
            .filter(|(_, owners)| owners[0] == *node)
            .map(|(segment, _)| segment)
            .collect()
    }

    /// Iterate over `(segment, owners)` pairs in segment order.
    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, &[NodeId])> + '_ {
        self.segment_owners
            .iter()
            .enumerate()
            .map(|(segment, owners)| (segment, &owners[..]))
    }
}

impl PartialEq for ConsistentHash {
    fn eq(&self, other: &Self) -> bool {
        self.hash_function.name() == other.hash_function.name()
            && self.num_segments == other.num_segments
            && self.num_owners == other.num_owners
            && self.members == other.members
            && self.segment_owners == other.segment_owners
    }
}

impl Eq for ConsistentHash {}

impl fmt::Display for ConsistentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ConsistentHash(hash={}, num_owners={}, num_segments={}, members={})",
            self.hash_function.name(),
            self.num_owners,
            self.num_segments,
            self.members.len()
        )?;
        for (segment, owners) in self.segments() {
            write!(f, "{}: {}", segment, owners[0])?;
            if owners.len() > 1 {
                let backups: Vec<String> = owners[1..].iter().map(|n| n.to_string()).collect();
                write!(f, " ({})", backups.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Murmur3Hash, SipHash};

    const A: NodeId = NodeId(1);
    const B: NodeId = NodeId(2);
    const C: NodeId = NodeId(3);

    fn sample() -> ConsistentHash {
        ConsistentHash::new(
            Arc::new(Murmur3Hash),
            2,
            3,
            vec![A, B, C],
            vec![vec![A, B], vec![B, C], vec![C, A]],
        )
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let ch = sample();
        assert_eq!(ch.num_owners(), 2);
        assert_eq!(ch.num_segments(), 3);
        assert_eq!(ch.members(), &[A, B, C]);
        assert_eq!(ch.primary_owner_for_segment(1), B);
        assert_eq!(ch.owners_for_segment(2), &[C, A]);
        assert_eq!(ch.backup_owners_for_segment(0), &[B]);
    }

    #[test]
    fn test_key_lookup_matches_segment_lookup() {
        let ch = sample();
        for key in [&b"alpha"[..], b"beta", b"gamma", b""] {
            let segment = ch.segment_for(key);
            assert!(segment < 3);
            assert_eq!(ch.owners(key), ch.owners_for_segment(segment));
            assert_eq!(ch.primary_owner(key), ch.owners(key)[0]);
            for node in [A, B, C] {
                assert_eq!(ch.is_local(&node, key), ch.owners(key).contains(&node));
            }
        }
    }

    #[test]
    fn test_all_owners_unions_segments() {
        let ch = sample();
        let keys: Vec<&[u8]> = vec![b"k1", b"k2", b"k3", b"k1"];
        let mut expected = HashSet::new();
        for key in &keys {
            expected.extend(ch.owners(key).iter().copied());
        }
        assert_eq!(ch.all_owners(keys), expected);
        assert!(ch.all_owners(Vec::<&[u8]>::new()).is_empty());
    }

    #[test]
    fn test_segments_for_owner() {
        let ch = sample();
        assert_eq!(ch.segments_for_owner(&A), BTreeSet::from([0, 2]));
        assert_eq!(ch.primary_segments_for_owner(&A), BTreeSet::from([0]));
        assert!(ch.segments_for_owner(&NodeId(99)).is_empty());
    }

    #[test]
    fn test_rejects_empty_owner_list() {
        let err = ConsistentHash::new(
            Arc::new(Murmur3Hash),
            1,
            2,
            vec![A],
            vec![vec![A], vec![]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_bad_construction_input() {
        let h: Arc<dyn HashFunction> = Arc::new(Murmur3Hash);
        // zero owners
        assert!(ConsistentHash::new(h.clone(), 0, 1, vec![A], vec![vec![A]]).is_err());
        // fewer segments than members
        assert!(ConsistentHash::new(h.clone(), 1, 1, vec![A, B], vec![vec![A]]).is_err());
        // duplicate members
        assert!(ConsistentHash::new(h.clone(), 1, 2, vec![A, A], vec![vec![A], vec![A]]).is_err());
        // duplicate owner
        assert!(ConsistentHash::new(h.clone(), 2, 1, vec![A], vec![vec![A, A]]).is_err());
        // non-member owner
        assert!(ConsistentHash::new(h.clone(), 1, 1, vec![A], vec![vec![B]]).is_err());
        // owner list count mismatch
        assert!(ConsistentHash::new(h, 1, 2, vec![A], vec![vec![A]]).is_err());
    }

    #[test]
    fn test_equality_is_structural_and_order_sensitive() {
        let ch = sample();
        assert_eq!(ch, sample());

        let swapped = ConsistentHash::new(
            Arc::new(Murmur3Hash),
            2,
            3,
            vec![A, B, C],
            vec![vec![B, A], vec![B, C], vec![C, A]],
        )
        .unwrap();
        assert_ne!(ch, swapped);

        let other_hash = ConsistentHash::new(
            Arc::new(SipHash),
            2,
            3,
            vec![A, B, C],
            vec![vec![A, B], vec![B, C], vec![C, A]],
        )
        .unwrap();
        assert_ne!(ch, other_hash);
    }

    #[test]
    fn test_display_routing_table() {
        let text = sample().to_string();
        assert!(text.starts_with("ConsistentHash(hash=Murmur3Hash, num_owners=2, num_segments=3"));
        assert_eq!(text.lines().count(), 4);
    }
}
