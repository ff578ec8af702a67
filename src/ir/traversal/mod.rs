//! IR graph traversal
//!
//! Linearises the operand DAG reachable from a set of sinks into a
//! deterministic post-order: every node comes after all of its operands.
//!
//! - [`EmissionMap`] - per-node [`Colour`] keyed by node identity
//! - [`post_order_from`] - post-order of a single root
//! - [`post_order_with`] - several roots under one shared emission map
//! - [`post_order`] / [`graph_size`] - the same on a fresh map
//!
//! Cycles are reported twice: a warning when a back-edge is first seen, and a
//! hard [`TraversalError::GraphLoop`] when the consumer cannot be finalised.

pub mod emission;
pub mod error;
pub mod post_order;

pub use emission::{Colour, EmissionMap, NodeKey};
pub use error::{BackEdge, TraversalError, TraversalResult};
pub use post_order::{graph_size, post_order, post_order_from, post_order_with, visit_post_order};
