//! Replica placement for segment-based consistent hashing.
//!
//! This crate computes which nodes own which segments:
//! - Initial placement for a fresh member list
//! - Minimal repair when members leave
//! - Rebalancing to restore an even load, optionally in two steps
//!   (add owners first, remove them later) so a live cluster never drops
//!   below its replication factor mid-transition
//!
//! Every operation is a pure function from an old `ConsistentHash` to a new
//! one; nothing here does I/O or keeps state between calls.

pub mod quota;
pub mod stats;
pub mod strategy;

pub use stats::OwnershipStatistics;
pub use strategy::{ConsistentHashFactory, DefaultConsistentHashFactory};
