//! Traversal errors

use std::fmt;

use thiserror::Error;

/// Traversal result
pub type TraversalResult<T> = Result<T, TraversalError>;

/// A back-edge seen while expanding a node's operands.
///
/// `path` lists the nodes of the loop in dependency order, starting and
/// ending at the operand: each entry uses the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackEdge {
    /// Node whose operand list closes the loop
    pub consumer: String,
    /// Operand that was still on the traversal stack
    pub operand: String,
    /// The loop itself
    pub path: Vec<String>,
}

impl fmt::Display for BackEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} [{}]", self.consumer, self.operand, self.path.join(" -> "))
    }
}

/// Traversal errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraversalError {
    /// An operand was not emitted when its consumer was finalised.
    ///
    /// No post-order is produced: a partial order would not be a valid
    /// topological sort.
    #[error("Graph loop found at {operand} (operand of {consumer})")]
    GraphLoop {
        consumer: String,
        operand: String,
        /// Back-edges reported before the traversal gave up
        back_edges: Vec<BackEdge>,
    },
}
