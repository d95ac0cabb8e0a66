//! Tests for consistent hash lookups.
//!
//! # Test Strategy
//!
//! 1. **Key to segment**: fixed hash values, negative hashes, stability
//! 2. **Owner lookups**: primary, backups, multi-key unions
//! 3. **Validation**: malformed owner tables are rejected
//! 4. **Views**: routing table and display output

use corelib::hash::murmur3::murmur3_32;
use corelib::hash::Murmur3Hash;
use corelib::segment::segment_for_hash;
use corelib::{ConsistentHash, Error, HashConfig, HashFunction, HashKind, Node, NodeId};
use std::sync::Arc;

const A: NodeId = NodeId(1);
const B: NodeId = NodeId(2);
const C: NodeId = NodeId(3);

fn three_node_hash() -> ConsistentHash {
    ConsistentHash::new(
        Arc::new(Murmur3Hash),
        2,
        3,
        vec![A, B, C],
        vec![vec![A, B], vec![B, C], vec![C, A]],
    )
    .unwrap()
}

// ============================================================================
// Key to Segment
// ============================================================================

#[test]
fn test_known_murmur_values_pick_segments() {
    let ch = ConsistentHash::new(
        Arc::new(Murmur3Hash),
        1,
        256,
        vec![A],
        (0..256).map(|_| vec![A]).collect(),
    )
    .unwrap();

    assert_eq!(murmur3_32(b"", 0), 0);
    assert_eq!(ch.segment_for(b""), 0);
    // 613153351 % 256
    assert_eq!(murmur3_32(b"hello", 0), 613153351);
    assert_eq!(ch.segment_for(b"hello"), 71);
}

#[test]
fn test_negative_hashes_use_magnitude() {
    assert_eq!(segment_for_hash(-1, 10), 1);
    assert_eq!(segment_for_hash(-13, 10), 3);
    assert_eq!(segment_for_hash(i32::MIN, 7), (2_147_483_648u64 % 7) as usize);
}

#[test]
fn test_segment_for_is_stable_across_instances() {
    let config = HashConfig {
        num_segments: 64,
        hash: HashKind::Xxh3,
        ..HashConfig::default()
    };
    let hash = config.hash.build();
    let first = ConsistentHash::new(
        Arc::clone(&hash),
        1,
        64,
        vec![A],
        (0..64).map(|_| vec![A]).collect(),
    )
    .unwrap();
    let second = ConsistentHash::new(
        hash,
        2,
        64,
        vec![B, C],
        (0..64).map(|s| if s % 2 == 0 { vec![B, C] } else { vec![C, B] }).collect(),
    )
    .unwrap();

    for key in ["user:1", "user:2", "order:77", ""] {
        assert_eq!(first.segment_for(key.as_bytes()), second.segment_for(key.as_bytes()));
    }
}

// ============================================================================
// Owner Lookups
// ============================================================================

#[test]
fn test_primary_and_backups() {
    let ch = three_node_hash();
    assert_eq!(ch.primary_owner_for_segment(1), B);
    assert_eq!(ch.backup_owners_for_segment(1), &[C]);
    assert_eq!(ch.owners_for_segment(2), &[C, A]);

    let key = b"some-key";
    let segment = ch.segment_for(key);
    assert_eq!(ch.owners(key), ch.owners_for_segment(segment));
    assert_eq!(ch.primary_owner(key), ch.owners_for_segment(segment)[0]);
    assert!(ch.is_local(&ch.primary_owner(key), key));
}

#[test]
fn test_all_owners_is_union() {
    let ch = three_node_hash();
    let keys = ["k1", "k2", "k3", "k4", "k5", "k6", "k7", "k8"];
    let owners = ch.all_owners(keys);
    for key in keys {
        for owner in ch.owners(key.as_bytes()) {
            assert!(owners.contains(owner));
        }
    }
    assert!(ch.all_owners(Vec::<&[u8]>::new()).is_empty());
}

#[test]
fn test_segments_for_owner() {
    let ch = three_node_hash();
    assert_eq!(ch.segments_for_owner(&A).into_iter().collect::<Vec<_>>(), vec![0, 2]);
    assert_eq!(ch.primary_segments_for_owner(&A).into_iter().collect::<Vec<_>>(), vec![0]);
    assert!(ch.segments_for_owner(&NodeId(99)).is_empty());
}

#[test]
fn test_single_owner_has_no_backups() {
    let ch = ConsistentHash::new(Arc::new(Murmur3Hash), 3, 2, vec![A], vec![vec![A], vec![A]])
        .unwrap();
    assert_eq!(ch.actual_num_owners(), 1);
    assert!(ch.backup_owners_for_segment(0).is_empty());
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_rejects_malformed_tables() {
    let h: Arc<dyn HashFunction> = Arc::new(Murmur3Hash);
    let cases = vec![
        // non-member owner
        (vec![A, B], vec![vec![A], vec![C]]),
        // empty owner list
        (vec![A, B], vec![vec![A], vec![]]),
        // duplicate owner
        (vec![A, B], vec![vec![A, A], vec![B]]),
        // wrong number of lists
        (vec![A, B], vec![vec![A]]),
        // duplicate member
        (vec![A, A], vec![vec![A], vec![A]]),
    ];
    for (members, owners) in cases {
        let result = ConsistentHash::new(Arc::clone(&h), 2, 2, members, owners);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

// ============================================================================
// Views
// ============================================================================

#[test]
fn test_routing_table_with_names() {
    let nodes = [Node::named("alpha"), Node::named("beta"), Node::named("gamma")];
    let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
    let ch = ConsistentHash::new(
        Arc::new(Murmur3Hash),
        2,
        3,
        ids.clone(),
        vec![
            vec![ids[0], ids[1]],
            vec![ids[1], ids[2]],
            vec![ids[2], ids[0]],
        ],
    )
    .unwrap();

    let table = corelib::RoutingTable::new(&ch, |id| {
        nodes
            .iter()
            .find(|n| n.id == *id)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    });
    assert_eq!(table.segments[2], vec!["gamma", "alpha"]);
    assert_eq!(table.ownership["beta"].primary, 1);
    assert_eq!(table.ownership["beta"].total, 2);
}

#[test]
fn test_display_lists_every_segment() {
    let text = three_node_hash().to_string();
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains(&format!("1: {} ({})", B, C)));
}
