//! Serialized graph descriptions
//!
//! Graph files describe a small IR graph by name so it can be traversed and
//! dumped without a tensor front-end:
//!
//! ```ron
//! (
//!     nodes: [
//!         (name: "x", op: "lazy::device_data"),
//!         (name: "y", op: "aten::neg", operands: ["x"]),
//!         (name: "z", op: "aten::add", operands: ["y", "x:0"]),
//!     ],
//!     roots: ["z"],
//! )
//! ```
//!
//! Operands must name a node defined earlier in the list, which keeps every
//! loaded graph acyclic. An operand `name:k` uses output `k` of `name`.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::node::{Node, NodePtr, Output};
use super::traversal::{graph_size, post_order, TraversalResult};

/// Graph loading errors
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graph parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("Graph parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported graph file: {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error("Duplicate node name: {0}")]
    DuplicateNode(String),

    #[error("Node `{node}` refers to unknown operand `{operand}`")]
    UnknownOperand { node: String, operand: String },

    #[error("Node `{node}` has a malformed operand reference `{operand}`")]
    BadOperand { node: String, operand: String },

    #[error("Node `{node}` uses output {index} of `{operand}`, which has {num_outputs} output(s)")]
    OutputOutOfRange {
        node: String,
        operand: String,
        index: usize,
        num_outputs: usize,
    },

    #[error("Unknown root: {0}")]
    UnknownRoot(String),
}

/// One node of a graph file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    pub op: String,
    #[serde(default)]
    pub operands: Vec<String>,
    #[serde(default = "default_num_outputs")]
    pub num_outputs: usize,
}

fn default_num_outputs() -> usize {
    1
}

/// Contents of a graph file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphDef {
    pub nodes: Vec<NodeDef>,
    /// Sinks to traverse from. Empty means every node nobody consumes.
    #[serde(default)]
    pub roots: Vec<String>,
}

/// Graph file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Ron,
    Json,
}

impl GraphFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ron" => Some(GraphFormat::Ron),
            "json" => Some(GraphFormat::Json),
            _ => None,
        }
    }
}

/// A loaded graph: named nodes in definition order plus the chosen sinks.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: IndexMap<String, NodePtr>,
    roots: Vec<NodePtr>,
}

impl Graph {
    /// Read and build a graph file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let format =
            GraphFormat::from_path(path).ok_or_else(|| GraphError::UnknownFormat(path.to_path_buf()))?;
        let source = fs::read_to_string(path)?;
        Self::parse(&source, format)
    }

    /// Build a graph from its textual description.
    pub fn parse(source: &str, format: GraphFormat) -> Result<Self, GraphError> {
        let def: GraphDef = match format {
            GraphFormat::Ron => ron::from_str(source)?,
            GraphFormat::Json => serde_json::from_str(source)?,
        };
        Self::from_def(&def)
    }

    /// Build the nodes of `def`.
    pub fn from_def(def: &GraphDef) -> Result<Self, GraphError> {
        let mut nodes: IndexMap<String, NodePtr> = IndexMap::with_capacity(def.nodes.len());
        let mut consumed = vec![false; def.nodes.len()];

        for node_def in &def.nodes {
            if nodes.contains_key(&node_def.name) {
                return Err(GraphError::DuplicateNode(node_def.name.clone()));
            }
            let mut operands = Vec::with_capacity(node_def.operands.len());
            for reference in &node_def.operands {
                let (name, index) = split_reference(reference).ok_or_else(|| GraphError::BadOperand {
                    node: node_def.name.clone(),
                    operand: reference.clone(),
                })?;
                let (slot, _, producer) =
                    nodes.get_full(name).ok_or_else(|| GraphError::UnknownOperand {
                        node: node_def.name.clone(),
                        operand: name.to_string(),
                    })?;
                if index >= producer.num_outputs() {
                    return Err(GraphError::OutputOutOfRange {
                        node: node_def.name.clone(),
                        operand: name.to_string(),
                        index,
                        num_outputs: producer.num_outputs(),
                    });
                }
                consumed[slot] = true;
                operands.push(Output::new(producer.clone(), index));
            }
            let node = Node::new(node_def.op.as_str(), operands, node_def.num_outputs);
            nodes.insert(node_def.name.clone(), node);
        }

        let roots = if def.roots.is_empty() {
            nodes
                .values()
                .zip(&consumed)
                .filter(|(_, used)| !**used)
                .map(|(node, _)| node.clone())
                .collect()
        } else {
            def.roots
                .iter()
                .map(|name| {
                    nodes
                        .get(name)
                        .cloned()
                        .ok_or_else(|| GraphError::UnknownRoot(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        debug!(
            "loaded graph: {} node(s), {} root(s)",
            nodes.len(),
            roots.len()
        );
        Ok(Self { nodes, roots })
    }

    /// Node defined under `name`.
    pub fn node(&self, name: &str) -> Option<&NodePtr> {
        self.nodes.get(name)
    }

    /// All nodes with their names, in definition order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodePtr)> + '_ {
        self.nodes.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// The sinks, in file order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> + '_ {
        self.roots.iter().map(|node| &**node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Post-order of everything reachable from the sinks.
    pub fn post_order(&self) -> TraversalResult<Vec<&Node>> {
        post_order(self.roots())
    }

    /// Number of nodes reachable from the sinks.
    pub fn size(&self) -> TraversalResult<usize> {
        graph_size(self.roots())
    }
}

/// Split `name` or `name:index`.
fn split_reference(reference: &str) -> Option<(&str, usize)> {
    let (name, index) = match reference.rsplit_once(':') {
        Some((name, index))
            if !name.ends_with(':') && !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) =>
        {
            (name, index.parse().ok()?)
        }
        Some((_, "")) => return None,
        _ => (reference, 0),
    };
    if name.is_empty() {
        None
    } else {
        Some((name, index))
    }
}
