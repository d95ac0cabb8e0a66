//! Error types for the core library.
//!
//! Two families of failure exist and callers are expected to tell them apart:
//!
//! - [`Error::Config`] means the caller handed us bad input (zero owners, fewer
//!   segments than members, an empty owner list, ...). Fix the input.
//! - [`Error::Invariant`] means the placement algorithm itself is broken. It is
//!   never caused by input and should be treated as a bug.
//!
//! Nothing here is transient: no operation in this workspace does I/O, so
//! there is nothing worth retrying.

use crate::node::NodeId;
use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or transforming a consistent hash.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid configuration or construction input.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Ownership statistics were requested for a node that is not tracked.
    #[error("node {0} is not tracked by these ownership statistics")]
    UnknownNode(NodeId),

    /// The placement algorithm broke one of its own invariants.
    #[error("consistent hash invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Build a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Build an invariant violation and log it.
    ///
    /// Invariant violations indicate a defect, so they are always logged at
    /// error level where they are raised, even if the caller later drops the
    /// error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(target: "corelib::invariant", "{}", msg);
        Error::Invariant(msg)
    }

    /// True if this error indicates an algorithm defect rather than bad input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::Invariant(_) | Error::UnknownNode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(!Error::config("num_owners must be > 0").is_invariant_violation());
        assert!(Error::invariant("worklist not drained").is_invariant_violation());
        assert!(Error::UnknownNode(NodeId(7)).is_invariant_violation());
    }

    #[test]
    fn test_error_display() {
        let err = Error::config("numSegments (2) < members (3)");
        assert_eq!(
            err.to_string(),
            "invalid configuration: numSegments (2) < members (3)"
        );
    }
}
