//! Default consistent hash factory.
//!
//! Produces consistent hashes where, for `n` members, `S` segments and
//! `k = min(num_owners, n)` owners per segment:
//!
//! - every segment has exactly `k` distinct owners
//! - every node primary-owns `floor(S/n)` or `ceil(S/n)` segments
//! - every node owns `floor(S*k/n)` or `ceil(S*k/n)` segments
//!
//! with the extra segments going to the oldest members. `update_members`
//! trades balance for minimal movement; the next `rebalance` restores it.
//!
//! # Example
//!
//! ```rust
//! use corelib::hash::Murmur3Hash;
//! use corelib::NodeId;
//! use replication::{ConsistentHashFactory, DefaultConsistentHashFactory};
//! use std::sync::Arc;
//!
//! let factory = DefaultConsistentHashFactory::new();
//! let members = [NodeId(1), NodeId(2), NodeId(3)];
//! let ch = factory.create(Arc::new(Murmur3Hash), 2, 6, &members).unwrap();
//! assert_eq!(ch.owners(b"my-key").len(), 2);
//! ```

use crate::strategy::leavers::remove_leavers;
use crate::strategy::rebalance::rebalance_owners;
use crate::strategy::ConsistentHashFactory;
use corelib::{ConsistentHash, Error, HashFunction, NodeId, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Balanced, seniority-ordered consistent hash factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConsistentHashFactory;

impl DefaultConsistentHashFactory {
    pub fn new() -> Self {
        Self
    }
}

fn validate_members(members: &[NodeId], num_segments: usize) -> Result<()> {
    if members.is_empty() {
        return Err(Error::config("the member list should not be empty"));
    }
    let distinct: HashSet<&NodeId> = members.iter().collect();
    if distinct.len() != members.len() {
        return Err(Error::config("the member list contains duplicates"));
    }
    if num_segments < members.len() {
        return Err(Error::config(format!(
            "the number of segments ({}) should be at least the number of members ({})",
            num_segments,
            members.len()
        )));
    }
    Ok(())
}

impl ConsistentHashFactory for DefaultConsistentHashFactory {
    #[instrument(level = "debug", skip_all, fields(num_owners = num_owners, num_segments = num_segments, members = members.len()))]
    fn create(
        &self,
        hash_function: Arc<dyn HashFunction>,
        num_owners: usize,
        num_segments: usize,
        members: &[NodeId],
    ) -> Result<Arc<ConsistentHash>> {
        if num_owners == 0 {
            return Err(Error::config("the number of owners should be greater than 0"));
        }
        validate_members(members, num_segments)?;

        // Seed with round-robin primaries only. Round robin alone does not
        // spread backups evenly for every (segments, owners, members)
        // combination, so the rebalance below is not optional.
        let seed_owners = (0..num_segments)
            .map(|segment| vec![members[segment % members.len()]])
            .collect();
        let seed = Arc::new(ConsistentHash::new(
            hash_function,
            num_owners,
            num_segments,
            members.to_vec(),
            seed_owners,
        )?);

        self.rebalance(&seed, false)
    }

    #[instrument(level = "debug", skip_all, fields(from = base.members().len(), to = new_members.len()))]
    fn update_members(
        &self,
        base: &Arc<ConsistentHash>,
        new_members: &[NodeId],
    ) -> Result<Arc<ConsistentHash>> {
        if new_members == base.members() {
            return Ok(Arc::clone(base));
        }
        validate_members(new_members, base.num_segments())?;

        let (owners, orphaned) = remove_leavers(base, new_members)?;
        metrics::counter!("ch_update_members_total").increment(1);
        metrics::counter!("ch_leaver_segments_repaired_total").increment(orphaned as u64);

        let ch = ConsistentHash::new(
            Arc::clone(base.hash_function()),
            base.num_owners(),
            base.num_segments(),
            new_members.to_vec(),
            owners,
        )?;
        Ok(Arc::new(ch))
    }

    #[instrument(level = "debug", skip_all, fields(segments = base.num_segments(), members = base.members().len(), keep_existing_owners = keep_existing_owners))]
    fn rebalance(
        &self,
        base: &Arc<ConsistentHash>,
        keep_existing_owners: bool,
    ) -> Result<Arc<ConsistentHash>> {
        metrics::counter!("ch_rebalance_total").increment(1);

        let (owners, _) = rebalance_owners(base, keep_existing_owners)?;
        let ch = ConsistentHash::new(
            Arc::clone(base.hash_function()),
            base.num_owners(),
            base.num_segments(),
            base.members().to_vec(),
            owners,
        )?;

        // Hand back the base hash if nothing changed.
        if ch == **base {
            metrics::counter!("ch_rebalance_noop_total").increment(1);
            debug!("rebalance left the consistent hash unchanged");
            return Ok(Arc::clone(base));
        }
        Ok(Arc::new(ch))
    }

    fn union(&self, first: &ConsistentHash, second: &ConsistentHash) -> Result<Arc<ConsistentHash>> {
        if first.hash_function().name() != second.hash_function().name() {
            return Err(Error::config(
                "the consistent hash objects must have the same hash function",
            ));
        }
        if first.num_segments() != second.num_segments() {
            return Err(Error::config(
                "the consistent hash objects must have the same number of segments",
            ));
        }
        if first.num_owners() != second.num_owners() {
            return Err(Error::config(
                "the consistent hash objects must have the same number of owners",
            ));
        }

        let mut members = first.members().to_vec();
        merge_into(&mut members, second.members());

        let owners = first
            .segments()
            .map(|(segment, list)| {
                let mut merged = list.to_vec();
                merge_into(&mut merged, second.owners_for_segment(segment));
                merged
            })
            .collect();

        let ch = ConsistentHash::new(
            Arc::clone(first.hash_function()),
            first.num_owners(),
            first.num_segments(),
            members,
            owners,
        )?;
        Ok(Arc::new(ch))
    }

    fn name(&self) -> &'static str {
        "DefaultConsistentHashFactory"
    }
}

/// Append the elements of `extra` that `target` does not contain yet.
fn merge_into(target: &mut Vec<NodeId>, extra: &[NodeId]) {
    for node in extra {
        if !target.contains(node) {
            target.push(*node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::hash::{Murmur3Hash, SipHash};
    use corelib::HashConfig;

    const A: NodeId = NodeId(1);
    const B: NodeId = NodeId(2);
    const C: NodeId = NodeId(3);

    fn factory() -> DefaultConsistentHashFactory {
        DefaultConsistentHashFactory::new()
    }

    #[test]
    fn test_create_rejects_bad_config() {
        let f = factory();
        let h: Arc<dyn HashFunction> = Arc::new(Murmur3Hash);
        assert!(matches!(f.create(h.clone(), 0, 4, &[A]), Err(Error::Config(_))));
        assert!(matches!(f.create(h.clone(), 1, 2, &[A, B, C]), Err(Error::Config(_))));
        assert!(matches!(f.create(h.clone(), 1, 4, &[]), Err(Error::Config(_))));
        assert!(matches!(f.create(h, 1, 4, &[A, A]), Err(Error::Config(_))));
    }

    #[test]
    fn test_create_single_owner_is_round_robin() {
        let ch = factory().create(Arc::new(Murmur3Hash), 1, 6, &[A, B, C]).unwrap();
        let primaries: Vec<NodeId> = (0..6).map(|s| ch.primary_owner_for_segment(s)).collect();
        assert_eq!(primaries, vec![A, B, C, A, B, C]);
    }

    #[test]
    fn test_create_from_config() {
        let config = HashConfig {
            num_owners: 3,
            num_segments: 16,
            ..HashConfig::default()
        };
        let ch = factory().create_from_config(&config, &[A, B]).unwrap();
        assert_eq!(ch.num_owners(), 3);
        assert_eq!(ch.actual_num_owners(), 2);
        assert!(ch.segments().all(|(_, owners)| owners.len() == 2));
    }

    #[test]
    fn test_update_members_same_list_returns_same_instance() {
        let f = factory();
        let ch = f.create(Arc::new(Murmur3Hash), 2, 6, &[A, B, C]).unwrap();
        let same = f.update_members(&ch, &[A, B, C]).unwrap();
        assert!(Arc::ptr_eq(&ch, &same));
    }

    #[test]
    fn test_update_members_rejects_empty() {
        let f = factory();
        let ch = f.create(Arc::new(Murmur3Hash), 2, 6, &[A, B, C]).unwrap();
        assert!(matches!(f.update_members(&ch, &[]), Err(Error::Config(_))));
    }

    #[test]
    fn test_rebalance_balanced_returns_same_instance() {
        let f = factory();
        let ch = f.create(Arc::new(Murmur3Hash), 2, 6, &[A, B, C]).unwrap();
        let again = f.rebalance(&ch, false).unwrap();
        assert!(Arc::ptr_eq(&ch, &again));
        let kept = f.rebalance(&ch, true).unwrap();
        assert!(Arc::ptr_eq(&ch, &kept));
    }

    #[test]
    fn test_union_merges_owner_lists() {
        let f = factory();
        let h: Arc<dyn HashFunction> = Arc::new(Murmur3Hash);
        let first = ConsistentHash::new(
            h.clone(),
            2,
            3,
            vec![A, B],
            vec![vec![A, B], vec![B], vec![A]],
        )
        .unwrap();
        let second = ConsistentHash::new(
            h,
            2,
            3,
            vec![C, A],
            vec![vec![C, A], vec![A, C], vec![A]],
        )
        .unwrap();

        let merged = f.union(&first, &second).unwrap();
        assert_eq!(merged.members(), &[A, B, C]);
        assert_eq!(merged.owners_for_segment(0), &[A, B, C]);
        assert_eq!(merged.owners_for_segment(1), &[B, A, C]);
        assert_eq!(merged.owners_for_segment(2), &[A]);
    }

    #[test]
    fn test_union_rejects_mismatch() {
        let f = factory();
        let first =
            ConsistentHash::new(Arc::new(Murmur3Hash), 1, 1, vec![A], vec![vec![A]]).unwrap();
        let second = ConsistentHash::new(Arc::new(SipHash), 1, 1, vec![A], vec![vec![A]]).unwrap();
        assert!(matches!(f.union(&first, &second), Err(Error::Config(_))));

        let third =
            ConsistentHash::new(Arc::new(Murmur3Hash), 2, 1, vec![A], vec![vec![A]]).unwrap();
        assert!(matches!(f.union(&first, &third), Err(Error::Config(_))));
    }
}
