//! IR nodes
//!
//! The traversal core only needs two things from a node: its operand edges
//! and a way to print it. Those are the [`IrNode`] and [`Operand`] traits.
//! [`Node`] is the reference implementation used by graph files, the CLI and
//! the tests.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::node_id::{NodeId, NODE_IDS};

/// An operand edge: names the producer node and which of its outputs is used.
pub trait Operand {
    /// Node type the edge points at.
    type Node;

    /// The producer node.
    fn node(&self) -> &Self::Node;

    /// Output index on the producer. Ignored by traversal.
    fn index(&self) -> usize {
        0
    }
}

/// A vertex of the lazy IR graph.
///
/// Implementors must return operands in a stable order: the post-order is a
/// function of that order. Identity is the node address, so a node must not
/// move while it is being traversed (it is borrowed for the duration anyway).
pub trait IrNode: fmt::Display + Sized {
    /// Edge type exposed by [`IrNode::operands`].
    type Operand: Operand<Node = Self>;

    /// Ordered operand edges of this node.
    fn operands(&self) -> &[Self::Operand];

    /// Short label used by graph dumps. Defaults to the `Display` text.
    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

/// Plain references are edges too, which suits arena-allocated graphs.
impl<'a, N> Operand for &'a N {
    type Node = N;

    #[inline]
    fn node(&self) -> &N {
        self
    }
}

/// Shared handle to a reference [`Node`].
pub type NodePtr = Arc<Node>;

/// Operator name, e.g. `aten::add` or `lazy::device_data`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpKind(String);

impl OpKind {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        OpKind(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OpKind {
    fn from(name: &str) -> Self {
        OpKind::new(name)
    }
}

impl From<String> for OpKind {
    fn from(name: String) -> Self {
        OpKind(name)
    }
}

/// Operand edge of a reference [`Node`].
#[derive(Debug, Clone)]
pub struct Output {
    node: NodePtr,
    index: usize,
}

impl Output {
    /// Edge to output `index` of `node`.
    #[inline]
    pub fn new(node: NodePtr, index: usize) -> Self {
        debug_assert!(
            index < node.num_outputs(),
            "output index {} out of range for {}",
            index,
            node
        );
        Self { node, index }
    }

    /// The producer handle.
    #[inline]
    pub fn producer(&self) -> &NodePtr {
        &self.node
    }
}

impl From<NodePtr> for Output {
    fn from(node: NodePtr) -> Self {
        Output::new(node, 0)
    }
}

impl Operand for Output {
    type Node = Node;

    #[inline]
    fn node(&self) -> &Node {
        &self.node
    }

    #[inline]
    fn index(&self) -> usize {
        self.index
    }
}

/// A recorded tensor operation.
///
/// Nodes are immutable once built and can only refer to nodes that already
/// exist, so graphs of `Node`s are acyclic by construction.
pub struct Node {
    id: NodeId,
    op: OpKind,
    operands: SmallVec<[Output; 4]>,
    num_outputs: usize,
}

impl Node {
    /// Record a node with the given operands.
    ///
    /// # Examples
    ///
    /// ```
    /// use lazy_tensor_ir::ir::{IrNode, Node, Output};
    ///
    /// let x = Node::leaf("lazy::device_data");
    /// let y = Node::new("aten::neg", [Output::from(x.clone())], 1);
    /// assert_eq!(y.operands().len(), 1);
    /// ```
    pub fn new(
        op: impl Into<OpKind>,
        operands: impl IntoIterator<Item = Output>,
        num_outputs: usize,
    ) -> NodePtr {
        Arc::new(Self {
            id: NODE_IDS.generate(),
            op: op.into(),
            operands: operands.into_iter().collect(),
            num_outputs,
        })
    }

    /// Record a node without operands and a single output.
    pub fn leaf(op: impl Into<OpKind>) -> NodePtr {
        Self::new(op, std::iter::empty::<Output>(), 1)
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn op(&self) -> &OpKind {
        &self.op
    }

    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    #[inline]
    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }

    /// Check if this node has no operands.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.operands.is_empty()
    }
}

impl IrNode for Node {
    type Operand = Output;

    #[inline]
    fn operands(&self) -> &[Output] {
        &self.operands
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.op.as_str())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.id)?;
        if self.num_outputs != 1 {
            write!(f, ", num_outputs={}", self.num_outputs)?;
        }
        Ok(())
    }
}

// Hand-written so printing a node never walks its whole operand graph.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands: Vec<String> = self
            .operands
            .iter()
            .map(|o| format!("{}.{}", o.node.id, o.index))
            .collect();
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("op", &self.op)
            .field("operands", &operands)
            .field("num_outputs", &self.num_outputs)
            .finish()
    }
}

// Operand chains can be far deeper than the call stack allows for a
// recursive drop, so release uniquely owned operands from a work list.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending: Vec<NodePtr> = self.operands.drain(..).map(|o| o.node).collect();
        while let Some(node) = pending.pop() {
            if let Some(mut inner) = Arc::into_inner(node) {
                pending.extend(inner.operands.drain(..).map(|o| o.node));
            }
        }
    }
}
