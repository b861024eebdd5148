use std::time::Duration;

use thiserror::Error;

use orgscope_core::NodeId;

/// Failure to resolve part of the org tree.
///
/// All variants are fatal to the request that triggered them; none are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The referenced node is absent from the repository (client error).
    #[error("org node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node was reached twice during traversal: the stored tree is corrupt.
    #[error("cycle detected in org tree at node {0}")]
    CycleDetected(NodeId),

    /// The subtree is deeper than the resolver is allowed to walk.
    #[error("org subtree deeper than the configured maximum of {max_depth}")]
    DepthExceeded { max_depth: usize },

    /// The traversal ran past its caller-supplied time budget.
    #[error("descendant resolution exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl NodeError {
    /// `true` for errors that indicate corrupted tree data rather than bad input.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, NodeError::CycleDetected(_))
    }
}
