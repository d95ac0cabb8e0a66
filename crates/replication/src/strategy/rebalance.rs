//! The rebalance algorithm.
//!
//! Works on a table of member indices (`owners[segment] = [primary, backups..]`)
//! and a single [`OwnershipStatistics`] kept in sync with it. Two phases run
//! over the whole table:
//!
//! 1. **Primary owners.** Every node should primary-own its quota of
//!    segments. Walking segments from last to first, a segment whose primary
//!    is over quota gets a new primary: preferably one of its own backups
//!    that is under quota (no data moves), otherwise the next under-quota
//!    node from a round-robin worklist. In the latter case the old primary
//!    stays on as a backup for now.
//! 2. **All owners.** Every segment should have `actual_num_owners` owners and
//!    every node should own its quota of slots. Extra owners are dropped in
//!    two backward passes (first only over-quota owners of oversized
//!    segments, then anything still over quota or oversized), then short
//!    segments are filled forward from a second worklist, stealing a backup
//!    from another segment when every pending candidate already owns the
//!    segment being filled.
//!
//! Walking backward means the low segments are visited last and change the
//! least from one rebalance to the next.
//!
//! When the result is balanced every node sits exactly at its quota, which
//! is what makes the algorithm idempotent.

use crate::quota::{expected_counts, round_robin_worklist};
use crate::stats::OwnershipStatistics;
use corelib::{ConsistentHash, Error, NodeId, Result, SegmentId};
use tracing::{debug, trace};

/// Counters describing what a rebalance did, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RebalanceStats {
    pub promoted_backups: usize,
    pub new_primaries: usize,
    pub removed_owners: usize,
    pub added_owners: usize,
    pub steals: usize,
}

/// Compute balanced owner lists for `ch`.
///
/// With `keep_existing_owners`, each segment's list is the balanced list
/// followed by the previous owners that the balanced list dropped: owners
/// are only ever added, and rebalancing that result again without the flag
/// yields exactly the balanced lists.
pub(crate) fn rebalance_owners(
    ch: &ConsistentHash,
    keep_existing_owners: bool,
) -> Result<(Vec<Vec<NodeId>>, RebalanceStats)> {
    let members = ch.members();
    let mut stats = OwnershipStatistics::from_hash(ch, members);
    let mut report = RebalanceStats::default();

    let mut owners: Vec<Vec<usize>> = Vec::with_capacity(ch.num_segments());
    for (_, segment_owners) in ch.segments() {
        let indices = segment_owners
            .iter()
            .map(|node| stats.require_index(node))
            .collect::<Result<Vec<_>>>()?;
        owners.push(indices);
    }
    let previous = if keep_existing_owners {
        Some(owners.clone())
    } else {
        None
    };

    fix_primary_owners(&mut owners, &mut stats, &mut report)?;
    fix_owners(&mut owners, &mut stats, ch.actual_num_owners(), &mut report)?;

    if let Some(previous) = previous {
        for (segment, old) in previous.into_iter().enumerate() {
            for owner in old {
                if !owners[segment].contains(&owner) {
                    owners[segment].push(owner);
                }
            }
        }
    }

    debug!(
        promoted_backups = report.promoted_backups,
        new_primaries = report.new_primaries,
        removed_owners = report.removed_owners,
        added_owners = report.added_owners,
        steals = report.steals,
        keep_existing_owners,
        "rebalance computed"
    );

    let owners = owners
        .into_iter()
        .map(|segment| segment.into_iter().map(|i| members[i]).collect())
        .collect();
    Ok((owners, report))
}

/// Phase 1: bring every node to its primary-owned quota.
fn fix_primary_owners(
    owners: &mut [Vec<usize>],
    stats: &mut OwnershipStatistics,
    report: &mut RebalanceStats,
) -> Result<()> {
    let num_segments = owners.len();
    let expected = expected_counts(stats.nodes().len(), num_segments);
    let mut candidates = round_robin_worklist(&expected, |i| stats.primary_owned(i));

    for segment in (0..num_segments).rev() {
        let primary = owners[segment][0];
        if stats.primary_owned(primary) <= expected[primary] {
            continue;
        }

        // Prefer promoting a backup: it already has the data.
        let backup = candidates
            .iter()
            .position(|c| owners[segment][1..].contains(c));
        if let Some(pos) = backup {
            let new_primary = candidates.remove(pos).ok_or_else(|| {
                Error::invariant("primary candidate vanished from the worklist")
            })?;
            let old_pos = owners[segment]
                .iter()
                .position(|&o| o == new_primary)
                .ok_or_else(|| Error::invariant("promoted backup is not an owner"))?;
            owners[segment].remove(old_pos);
            owners[segment].insert(0, new_primary);

            stats.dec_primary_owned(primary);
            stats.inc_primary_owned(new_primary);
            report.promoted_backups += 1;
            trace!(segment, from = primary, to = new_primary, "promoted backup to primary");
        } else {
            let new_primary = candidates.pop_front().ok_or_else(|| {
                Error::invariant(format!(
                    "segment {} needs a new primary owner but no node is under its quota",
                    segment
                ))
            })?;
            // The old primary is demoted to backup; phase 2 decides whether
            // it stays.
            owners[segment].insert(0, new_primary);

            stats.inc_owned(new_primary);
            stats.dec_primary_owned(primary);
            stats.inc_primary_owned(new_primary);
            report.new_primaries += 1;
            trace!(segment, from = primary, to = new_primary, "assigned new primary");
        }
    }

    if !candidates.is_empty() {
        return Err(Error::invariant(format!(
            "{} primary ownership slots left unassigned",
            candidates.len()
        )));
    }
    Ok(())
}

/// Phase 2: bring every segment to `num_owners` owners and every node to its
/// owned quota.
fn fix_owners(
    owners: &mut [Vec<usize>],
    stats: &mut OwnershipStatistics,
    num_owners: usize,
    report: &mut RebalanceStats,
) -> Result<()> {
    let num_segments = owners.len();
    let expected = expected_counts(stats.nodes().len(), num_segments * num_owners);

    // Only drop owners that are both surplus to the segment and over quota.
    for segment in (0..num_segments).rev() {
        let list = &mut owners[segment];
        for j in (1..list.len()).rev() {
            if list.len() <= num_owners {
                break;
            }
            let owner = list[j];
            if stats.owned(owner) > expected[owner] {
                list.remove(j);
                stats.dec_owned(owner);
                report.removed_owners += 1;
            }
        }
    }

    // Now drop anything over quota, or anything left in an oversized segment.
    // Done as a second pass so that the first pass gets to pick the cheapest
    // removals.
    for segment in (0..num_segments).rev() {
        let list = &mut owners[segment];
        for j in (1..list.len()).rev() {
            let owner = list[j];
            if stats.owned(owner) > expected[owner] || list.len() > num_owners {
                list.remove(j);
                stats.dec_owned(owner);
                report.removed_owners += 1;
            }
        }
    }

    // No segment has more than num_owners owners now; fill the short ones.
    let mut candidates = round_robin_worklist(&expected, |i| stats.owned(i));
    for segment in 0..num_segments {
        while owners[segment].len() < num_owners {
            let fit = candidates
                .iter()
                .position(|c| !owners[segment].contains(c));
            match fit {
                Some(pos) => {
                    let new_owner = candidates.remove(pos).ok_or_else(|| {
                        Error::invariant("owner candidate vanished from the worklist")
                    })?;
                    owners[segment].push(new_owner);
                    stats.inc_owned(new_owner);
                    report.added_owners += 1;
                }
                None => {
                    let rejected = candidates.pop_front().ok_or_else(|| {
                        Error::invariant(format!(
                            "segment {} has {} owners but no node is under its quota",
                            segment,
                            owners[segment].len()
                        ))
                    })?;
                    steal_owner(owners, segment, rejected)?;
                    stats.inc_owned(rejected);
                    report.steals += 1;
                }
            }
        }
    }

    if !candidates.is_empty() {
        return Err(Error::invariant(format!(
            "{} ownership slots left unassigned after every segment reached {} owners",
            candidates.len(),
            num_owners
        )));
    }
    Ok(())
}

/// Give `dest` one more owner when every pending candidate already owns it.
///
/// Finds a segment that `replacement` does not own and that has a backup not
/// owning `dest`, moves that backup to `dest`, and puts `replacement` in its
/// place. The moved backup's count is unchanged; `replacement` gains one.
///
/// This is a backward linear scan, O(segments * owners) per call. Any
/// qualifying segment keeps the quotas and the per-segment distinctness, so
/// the first one found is taken.
fn steal_owner(owners: &mut [Vec<usize>], dest: SegmentId, replacement: usize) -> Result<()> {
    for segment in (0..owners.len()).rev() {
        if segment == dest || owners[segment].contains(&replacement) {
            continue;
        }

        for j in (1..owners[segment].len()).rev() {
            let stolen = owners[segment][j];
            if owners[dest].contains(&stolen) {
                continue;
            }

            owners[segment].remove(j);
            owners[dest].push(stolen);
            owners[segment].push(replacement);
            trace!(from = segment, to = dest, moved = stolen, replacement, "stole backup owner");
            return Ok(());
        }
    }

    Err(Error::invariant(format!(
        "no segment can give up a backup owner to segment {}",
        dest
    )))
}
