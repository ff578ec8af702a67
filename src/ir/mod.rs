//! Lazy-tensor IR graph
//!
//! - [`IrNode`](node::IrNode) / [`Operand`](node::Operand) - what traversal needs from a node
//! - [`Node`](node::Node) - reference node recorded by graph files and tests
//! - [`traversal`] - post-order linearisation, cycle detection, graph size
//! - [`dump`] - text and DOT renderings
//! - [`graph`] - serialized graph descriptions

pub mod dump;
pub mod graph;
pub mod node;
pub mod node_id;
pub mod traversal;

pub use dump::{to_dot, to_text, DumpFormat};
pub use graph::{Graph, GraphDef, GraphError, GraphFormat, NodeDef};
pub use node::{IrNode, Node, NodePtr, OpKind, Operand, Output};
pub use node_id::{NodeId, NodeIdGenerator};
pub use traversal::{
    graph_size, post_order, post_order_from, post_order_with, visit_post_order, BackEdge, Colour,
    EmissionMap, NodeKey, TraversalError, TraversalResult,
};

#[cfg(test)]
mod tests;
