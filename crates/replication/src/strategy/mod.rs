//! Consistent hash factory abstractions.
//!
//! A factory decides which nodes own which segments. Different factories
//! optimize for different goals; this crate ships the default one:
//!
//! - **DefaultConsistentHashFactory**: even primary and total ownership,
//!   ties broken by member seniority

pub mod default;
mod leavers;
mod rebalance;

pub use default::DefaultConsistentHashFactory;

use corelib::{ConsistentHash, HashConfig, HashFunction, NodeId, Result};
use std::sync::Arc;

/// Trait for consistent hash factories.
///
/// A factory turns membership changes into new consistent hashes:
/// 1. `create` builds the first placement for a member list
/// 2. `update_members` repairs a placement after members leave
/// 3. `rebalance` evens out ownership, e.g. after members join
///
/// Every method is a pure function. When nothing changes, the input `Arc` is
/// returned so callers can short-circuit with `Arc::ptr_eq`.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync) as they may be
/// shared across threads.
pub trait ConsistentHashFactory: Send + Sync + 'static {
    /// Build a balanced consistent hash for `members` (oldest first).
    ///
    /// # Errors
    /// [`corelib::Error::Config`] if `num_owners == 0`, `members` is empty
    /// or has duplicates, or `num_segments < members.len()`.
    fn create(
        &self,
        hash_function: Arc<dyn HashFunction>,
        num_owners: usize,
        num_segments: usize,
        members: &[NodeId],
    ) -> Result<Arc<ConsistentHash>>;

    /// Build a balanced consistent hash from configuration.
    fn create_from_config(
        &self,
        config: &HashConfig,
        members: &[NodeId],
    ) -> Result<Arc<ConsistentHash>> {
        config.validate()?;
        self.create(
            config.hash.build(),
            config.num_owners,
            config.num_segments,
            members,
        )
    }

    /// Adopt a new member list.
    ///
    /// Leavers lose their segments; segments left without owners get new
    /// ones. Every other owner list is kept as is. Joiners are only added to
    /// the member list.
    fn update_members(
        &self,
        base: &Arc<ConsistentHash>,
        new_members: &[NodeId],
    ) -> Result<Arc<ConsistentHash>>;

    /// Restore even ownership across the current members.
    ///
    /// With `keep_existing_owners`, owners are only added: the result is safe
    /// to install without removing data anywhere, and rebalancing it again
    /// without the flag gives the same result as rebalancing `base` without
    /// the flag.
    fn rebalance(
        &self,
        base: &Arc<ConsistentHash>,
        keep_existing_owners: bool,
    ) -> Result<Arc<ConsistentHash>>;

    /// Merge two consistent hashes with the same hash function, number of
    /// segments and number of owners. The first hash's owners come first in
    /// every segment.
    fn union(&self, first: &ConsistentHash, second: &ConsistentHash) -> Result<Arc<ConsistentHash>>;

    /// Get the factory name (for logging/debugging).
    fn name(&self) -> &'static str;
}
