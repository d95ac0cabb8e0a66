//! Membership reconciliation.
//!
//! Leavers are dropped from every owner list and nothing else moves. Only
//! segments that lost all of their owners get new ones, chosen from the new
//! member list by quota. Joiners are not given anything on purpose, beyond
//! possibly picking up orphaned segments: spreading load onto them is a
//! rebalance.

use crate::quota::expected_counts;
use crate::stats::OwnershipStatistics;
use corelib::{ConsistentHash, Error, NodeId, Result};
use tracing::{debug, trace};

/// Owner lists of `ch` with every node outside `new_members` removed and
/// orphaned segments reassigned.
///
/// Returns the lists and the number of orphaned segments that were repaired.
pub(crate) fn remove_leavers(
    ch: &ConsistentHash,
    new_members: &[NodeId],
) -> Result<(Vec<Vec<NodeId>>, usize)> {
    let leavers: Vec<NodeId> = ch
        .members()
        .iter()
        .filter(|m| !new_members.contains(m))
        .copied()
        .collect();

    let mut owners: Vec<Vec<NodeId>> = ch
        .segments()
        .map(|(_, list)| list.iter().filter(|o| !leavers.contains(o)).copied().collect())
        .collect();

    let orphaned = owners.iter().filter(|list| list.is_empty()).count();
    debug!(leavers = leavers.len(), orphaned, "removed leavers");
    if orphaned > 0 {
        assign_orphaned_segments(ch, new_members, &mut owners)?;
    }
    Ok((owners, orphaned))
}

/// Give every empty segment a primary owner and as many backups as quotas
/// allow.
///
/// Quotas are recomputed over `new_members`, and the statistics only count
/// what the remaining members already own, so there is always room for a
/// primary: remaining members primary-own at most
/// `num_segments - orphaned` segments.
fn assign_orphaned_segments(
    ch: &ConsistentHash,
    new_members: &[NodeId],
    owners: &mut [Vec<NodeId>],
) -> Result<()> {
    let mut stats = OwnershipStatistics::from_hash(ch, new_members);
    let num_segments = ch.num_segments();
    let actual_num_owners = ch.num_owners().min(new_members.len());
    let expected_primary = expected_counts(new_members.len(), num_segments);
    let expected_owned = expected_counts(new_members.len(), num_segments * actual_num_owners);

    for (segment, list) in owners.iter_mut().enumerate() {
        if !list.is_empty() {
            continue;
        }

        let primary = (0..new_members.len())
            .find(|&i| stats.primary_owned(i) < expected_primary[i])
            .ok_or_else(|| {
                Error::invariant(format!(
                    "no member is under its primary quota for orphaned segment {}",
                    segment
                ))
            })?;
        stats.inc_primary_owned(primary);
        stats.inc_owned(primary);
        let mut chosen = Vec::with_capacity(actual_num_owners);
        chosen.push(primary);

        // Start again from the oldest member for the backups.
        if actual_num_owners > 1 {
            for i in 0..new_members.len() {
                if chosen.len() == actual_num_owners {
                    break;
                }
                if stats.owned(i) < expected_owned[i] && !chosen.contains(&i) {
                    chosen.push(i);
                    stats.inc_owned(i);
                }
            }
        }

        // Fewer than actual_num_owners is fine here if the old hash was not
        // balanced; a rebalance tops them up.
        *list = chosen.into_iter().map(|i| new_members[i]).collect();
        trace!(segment, owners = list.len(), "assigned orphaned segment");
    }
    Ok(())
}
