//! Ownership quotas.
//!
//! A quota is the number of segment slots a node is expected to hold once
//! the consistent hash is balanced. When the slots don't divide evenly the
//! remainder goes to the oldest members, one extra slot each.

use std::collections::VecDeque;

/// Expected slot count for each of `num_nodes` nodes sharing `total_slots`.
///
/// Node `i` gets `total_slots / num_nodes`, plus one if
/// `i < total_slots % num_nodes`.
///
/// # Panics
/// Panics if `num_nodes` is 0.
pub fn expected_counts(num_nodes: usize, total_slots: usize) -> Vec<usize> {
    let base = total_slots / num_nodes;
    let remainder = total_slots % num_nodes;
    (0..num_nodes)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect()
}

/// Nodes that are below their quota, one entry per missing slot.
///
/// Entries are interleaved round-robin (`A B C A B A` rather than
/// `A A A B B C`) so that consumers walking the segments in order spread the
/// new assignments evenly instead of clustering one node's slots together.
pub fn round_robin_worklist(expected: &[usize], actual: impl Fn(usize) -> usize) -> VecDeque<usize> {
    let mut missing: Vec<usize> = expected
        .iter()
        .enumerate()
        .map(|(i, &e)| e.saturating_sub(actual(i)))
        .collect();

    let mut worklist = VecDeque::with_capacity(missing.iter().sum());
    let mut changed = true;
    while changed {
        changed = false;
        for (i, slots) in missing.iter_mut().enumerate() {
            if *slots > 0 {
                worklist.push_back(i);
                *slots -= 1;
                changed = true;
            }
        }
    }
    worklist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_counts_even() {
        assert_eq!(expected_counts(3, 6), vec![2, 2, 2]);
        assert_eq!(expected_counts(3, 12), vec![4, 4, 4]);
    }

    #[test]
    fn test_expected_counts_remainder_goes_to_oldest() {
        assert_eq!(expected_counts(5, 8), vec![2, 2, 2, 1, 1]);
        assert_eq!(expected_counts(5, 16), vec![4, 3, 3, 3, 3]);
        assert_eq!(expected_counts(4, 3), vec![1, 1, 1, 0]);
    }

    #[test]
    fn test_worklist_interleaves() {
        let worklist = round_robin_worklist(&[3, 2, 1], |_| 0);
        assert_eq!(Vec::from(worklist), vec![0, 1, 2, 0, 1, 0]);
    }

    #[test]
    fn test_worklist_skips_over_quota_nodes() {
        let actual = [5, 0, 1];
        let worklist = round_robin_worklist(&[2, 2, 2], |i| actual[i]);
        assert_eq!(Vec::from(worklist), vec![1, 2, 1]);
    }
}
