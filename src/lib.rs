//! Lazy-tensor IR traversal core
//!
//! Tensor operations recorded by a lazy backend form a DAG of IR nodes. Before
//! the graph can be lowered it has to be linearised: this crate computes the
//! post-order of the nodes reachable from a set of sinks, detects cycles and
//! counts graph size.
//!
//! # Example
//!
//! ```
//! use lazy_tensor_ir::ir::{graph_size, post_order, Node, Output};
//!
//! let leaf = Node::leaf("lazy::device_data");
//! let l = Node::new("aten::neg", [Output::from(leaf.clone())], 1);
//! let r = Node::new("aten::exp", [Output::from(leaf.clone())], 1);
//! let top = Node::new("aten::add", [Output::from(l.clone()), Output::from(r.clone())], 1);
//!
//! let order = post_order([&*top]).unwrap();
//! let ops: Vec<&str> = order.iter().map(|n| n.op().as_str()).collect();
//! assert_eq!(ops, ["lazy::device_data", "aten::neg", "aten::exp", "aten::add"]);
//! assert_eq!(graph_size([&*top]).unwrap(), 4);
//! ```

#![doc(html_root_url = "https://docs.rs/lazy-tensor-ir")]
#![warn(rust_2018_idioms)]

pub mod ir;
pub mod util;

pub use anyhow::{Context, Result};

use std::path::Path;

use hashbrown::HashMap;
use tracing::debug;

use crate::ir::{dump, Graph, IrNode, NodeKey};
use crate::util::config::DumpConfig;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name
pub const NAME: &str = "lazy-ir";

fn load_graph(path: &Path) -> Result<Graph> {
    debug!("loading graph {}", path.display());
    Graph::load(path).with_context(|| format!("Failed to load graph: {}", path.display()))
}

/// Post-order of a graph file, one `name<TAB>op` line per node.
pub fn order_file(path: &Path) -> Result<Vec<String>> {
    let graph = load_graph(path)?;
    let names: HashMap<NodeKey, &str> = graph
        .nodes()
        .map(|(name, node)| (NodeKey::of(&**node), name))
        .collect();
    let order = graph
        .post_order()
        .with_context(|| format!("Failed to order graph: {}", path.display()))?;
    Ok(order
        .into_iter()
        .map(|node| {
            let name = names.get(&NodeKey::of(node)).copied().unwrap_or("?");
            format!("{}\t{}", name, node.label())
        })
        .collect())
}

/// Number of nodes reachable from the sinks of a graph file.
pub fn size_file(path: &Path) -> Result<usize> {
    let graph = load_graph(path)?;
    graph
        .size()
        .with_context(|| format!("Failed to size graph: {}", path.display()))
}

/// Render a graph file as configured.
pub fn dump_file(path: &Path, config: &DumpConfig) -> Result<String> {
    let graph = load_graph(path)?;
    dump::render(graph.roots(), config.format, &config.graph_name)
        .with_context(|| format!("Failed to dump graph: {}", path.display()))
}
