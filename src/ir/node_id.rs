//! Node ID for IR nodes
//!
//! Every reference [`Node`](super::node::Node) carries a process-unique id,
//! handed out by a shared atomic generator.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A unique identifier for an IR node.
///
/// Ids are only used for naming and bookkeeping; traversal identity is the
/// node address (see [`NodeKey`](crate::ir::traversal::NodeKey)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Create a new NodeId with the given value.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazy_tensor_ir::ir::NodeId;
    ///
    /// let id = NodeId::new(42);
    /// assert_eq!(id.value(), 42);
    /// ```
    #[inline]
    pub const fn new(value: usize) -> Self {
        NodeId(value)
    }

    /// Returns the inner value of the node ID.
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generator for creating unique node IDs.
///
/// Thread-safe; nodes may be recorded from several threads even though a
/// single traversal never is.
#[derive(Debug)]
pub struct NodeIdGenerator {
    next_id: AtomicUsize,
}

impl NodeIdGenerator {
    /// Create a new node ID generator starting at zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazy_tensor_ir::ir::NodeIdGenerator;
    ///
    /// let generator = NodeIdGenerator::new();
    /// let id1 = generator.generate();
    /// let id2 = generator.generate();
    /// assert_ne!(id1, id2);
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(0),
        }
    }

    /// Generate a new unique node ID.
    #[inline]
    pub fn generate(&self) -> NodeId {
        NodeId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of ids handed out so far.
    #[inline]
    pub fn issued(&self) -> usize {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Default for NodeIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generator shared by every [`Node`](super::node::Node) in the process.
pub(crate) static NODE_IDS: NodeIdGenerator = NodeIdGenerator::new();
