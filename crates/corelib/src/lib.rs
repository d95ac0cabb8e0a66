//! Core library for segment-based consistent hashing.
//!
//! This crate provides the fundamental abstractions for data placement:
//! - Node identity
//! - Hash function adapters
//! - Segment mapping
//! - The immutable consistent hash snapshot and its lookup contract
//! - Configuration and error types

pub mod ch;
pub mod config;
pub mod error;
pub mod hash;
pub mod node;
pub mod segment;

pub use ch::{ConsistentHash, RoutingTable};
pub use config::HashConfig;
pub use error::{Error, Result};
pub use hash::{HashFunction, HashKind};
pub use node::{Node, NodeId};
pub use segment::SegmentId;
