//! Segment-based consistent hash.
//!
//! A consistent hash is an immutable snapshot mapping every segment to an
//! ordered owner list (primary first). It is the read-only lookup structure
//! consulted on every operation; new snapshots are produced by a factory
//! whenever membership changes.

pub mod consistent_hash;
pub mod routing;

pub use consistent_hash::ConsistentHash;
pub use routing::RoutingTable;
