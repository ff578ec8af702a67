//! Post-order linearisation of the IR graph
//!
//! Depth-first search over operand edges with an explicit work stack. The
//! graph can be tens of thousands of nodes deep, so nothing here recurses.

use smallvec::SmallVec;
use tracing::{debug, error, warn};

use super::emission::{Colour, EmissionMap, NodeKey};
use super::error::{BackEdge, TraversalError, TraversalResult};
use crate::ir::node::{IrNode, Operand};

/// Walk every node reachable from `root` that `emap` has not seen yet and
/// hand each one to `emit` in post-order.
///
/// Operands are explored in the order the node exposes them, so the first
/// operand's subtree is emitted first. Nodes already emitted through `emap`
/// (by an earlier root) are skipped.
///
/// An operand found on the stack while expanding a node is a back-edge: it is
/// logged as a warning, recorded, and not pushed again. The consumer then
/// fails its finalisation check and the walk stops with
/// [`TraversalError::GraphLoop`]. Nodes already passed to `emit` before the
/// failure stay marked in `emap`.
pub fn visit_post_order<'a, N, F>(
    root: &'a N,
    emap: &mut EmissionMap<'a>,
    mut emit: F,
) -> TraversalResult<()>
where
    N: IrNode,
    F: FnMut(&'a N),
{
    let mut stack: Vec<&'a N> = vec![root];
    // Nodes currently `Emitting`, outermost first.
    let mut path: Vec<&'a N> = Vec::new();
    let mut back_edges: Vec<BackEdge> = Vec::new();

    while let Some(&node) = stack.last() {
        match emap.colour(node) {
            Colour::Unseen => {
                emap.set(node, Colour::Emitting);
                path.push(node);

                let mut pending: SmallVec<[&'a N; 8]> = SmallVec::new();
                for operand in node.operands() {
                    let producer = operand.node();
                    match emap.colour(producer) {
                        Colour::Unseen => pending.push(producer),
                        Colour::Emitting => {
                            let edge = back_edge(&path, node, producer);
                            warn!("Graph loop found at {}: {}", producer, edge);
                            back_edges.push(edge);
                        }
                        Colour::Emitted => {}
                    }
                }
                // Reversed so the first operand ends up on top.
                stack.extend(pending.into_iter().rev());
            }
            Colour::Emitting => {
                let unfinished = node
                    .operands()
                    .iter()
                    .map(|operand| operand.node())
                    .find(|producer| !emap.is_emitted(*producer));
                if let Some(producer) = unfinished {
                    error!("Graph loop found at {} (operand of {})", producer, node);
                    return Err(TraversalError::GraphLoop {
                        consumer: node.to_string(),
                        operand: producer.to_string(),
                        back_edges,
                    });
                }

                emap.set(node, Colour::Emitted);
                let finished = path.pop();
                debug_assert!(finished.map(NodeKey::of) == Some(NodeKey::of(node)));
                emit(node);
                stack.pop();
            }
            Colour::Emitted => {
                stack.pop();
            }
        }
    }

    Ok(())
}

/// The loop closed by `consumer -> producer`, read off the emitting path.
fn back_edge<N: IrNode>(path: &[&N], consumer: &N, producer: &N) -> BackEdge {
    let key = NodeKey::of(producer);
    let start = path
        .iter()
        .position(|n| NodeKey::of(*n) == key)
        .unwrap_or(0);
    let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
    cycle.push(producer.to_string());
    BackEdge {
        consumer: consumer.to_string(),
        operand: producer.to_string(),
        path: cycle,
    }
}

/// Post-order of the nodes reachable from `root` and not yet in `emap`.
pub fn post_order_from<'a, N: IrNode>(
    root: &'a N,
    emap: &mut EmissionMap<'a>,
) -> TraversalResult<Vec<&'a N>> {
    let mut post_order = Vec::new();
    visit_post_order(root, emap, |node| post_order.push(node))?;
    Ok(post_order)
}

/// Post-order of several roots sharing one emission map.
///
/// Roots are walked in the given order and their outputs concatenated; a node
/// reachable from several roots appears once, under the first root that
/// reached it. Passing the same map to later calls extends the same order.
pub fn post_order_with<'a, N, I>(
    roots: I,
    emap: &mut EmissionMap<'a>,
) -> TraversalResult<Vec<&'a N>>
where
    N: IrNode + 'a,
    I: IntoIterator<Item = &'a N>,
{
    let mut post_order = Vec::new();
    let mut num_roots = 0usize;
    for root in roots {
        num_roots += 1;
        visit_post_order(root, emap, |node| post_order.push(node))?;
    }
    debug!(
        "post-order of {} root(s): {} node(s)",
        num_roots,
        post_order.len()
    );
    Ok(post_order)
}

/// Post-order of `roots` on a fresh emission map.
///
/// # Examples
///
/// ```
/// use lazy_tensor_ir::ir::{post_order, Node, Output};
///
/// let a = Node::leaf("a");
/// let b = Node::new("b", [Output::from(a.clone())], 1);
/// let order = post_order([&*b]).unwrap();
/// assert_eq!(order.len(), 2);
/// assert!(std::ptr::eq(order[0], &*a));
/// ```
pub fn post_order<'a, N, I>(roots: I) -> TraversalResult<Vec<&'a N>>
where
    N: IrNode + 'a,
    I: IntoIterator<Item = &'a N>,
{
    let mut emap = EmissionMap::new();
    post_order_with(roots, &mut emap)
}

/// Number of nodes reachable from `roots`.
///
/// Same value as `post_order(roots)?.len()`, counted without building the list.
pub fn graph_size<'a, N, I>(roots: I) -> TraversalResult<usize>
where
    N: IrNode + 'a,
    I: IntoIterator<Item = &'a N>,
{
    let mut emap = EmissionMap::new();
    let mut size = 0usize;
    for root in roots {
        visit_post_order(root, &mut emap, |_| size += 1)?;
    }
    Ok(size)
}
