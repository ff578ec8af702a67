//! Text and Graphviz renderings of an IR graph
//!
//! Both dumps number nodes by their post-order position, so a dump is only
//! produced for graphs that linearise cleanly.

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::node::{IrNode, Operand};
use super::traversal::{post_order, NodeKey, TraversalResult};

/// Output format of a graph dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    #[default]
    Text,
    Dot,
}

impl FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(DumpFormat::Text),
            "dot" | "graphviz" => Ok(DumpFormat::Dot),
            other => Err(format!("unknown dump format: {}", other)),
        }
    }
}

impl fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpFormat::Text => f.write_str("text"),
            DumpFormat::Dot => f.write_str("dot"),
        }
    }
}

/// Post-order plus the lookups both renderers need.
struct Numbered<'a, N> {
    order: Vec<&'a N>,
    index: HashMap<NodeKey, usize>,
    roots: HashMap<NodeKey, usize>,
}

impl<'a, N: IrNode + 'a> Numbered<'a, N> {
    fn new<I>(roots: I) -> TraversalResult<Self>
    where
        I: IntoIterator<Item = &'a N>,
    {
        let roots: Vec<&'a N> = roots.into_iter().collect();
        let order = post_order(roots.iter().copied())?;
        let index = order
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeKey::of(*node), i))
            .collect();
        let mut root_slots = HashMap::with_capacity(roots.len());
        for (slot, root) in roots.iter().enumerate() {
            root_slots.entry(NodeKey::of(*root)).or_insert(slot);
        }
        Ok(Self {
            order,
            index,
            roots: root_slots,
        })
    }

    fn position(&self, node: &N) -> usize {
        // Every operand of an emitted node is emitted too.
        self.index.get(&NodeKey::of(node)).copied().unwrap_or(usize::MAX)
    }
}

/// Render the graph below `roots` as text, one node per line.
///
/// ```text
/// IR {
///   %0 = lazy::device_data
///   %1 = aten::add(%0, %0), ROOT=0
/// }
/// ```
///
/// Operands using a non-zero output show it as `%i.k`.
pub fn to_text<'a, N, I>(roots: I) -> TraversalResult<String>
where
    N: IrNode + 'a,
    I: IntoIterator<Item = &'a N>,
{
    let graph = Numbered::new(roots)?;
    let mut out = String::from("IR {\n");
    for (i, node) in graph.order.iter().enumerate() {
        out.push_str(&format!("  %{} = {}", i, node.label()));
        let operands: Vec<String> = node
            .operands()
            .iter()
            .map(|operand| {
                let at = graph.position(operand.node());
                match operand.index() {
                    0 => format!("%{}", at),
                    k => format!("%{}.{}", at, k),
                }
            })
            .collect();
        if !operands.is_empty() {
            out.push_str(&format!("({})", operands.join(", ")));
        }
        if let Some(slot) = graph.roots.get(&NodeKey::of(*node)) {
            out.push_str(&format!(", ROOT={}", slot));
        }
        out.push('\n');
    }
    out.push_str("}\n");
    Ok(out)
}

/// Render the graph below `roots` in Graphviz DOT.
///
/// Edges point from producer to consumer; sinks are drawn as boxes.
pub fn to_dot<'a, N, I>(roots: I, graph_name: &str) -> TraversalResult<String>
where
    N: IrNode + 'a,
    I: IntoIterator<Item = &'a N>,
{
    let graph = Numbered::new(roots)?;
    let mut out = format!("digraph \"{}\" {{\n", escape(graph_name));
    for (i, node) in graph.order.iter().enumerate() {
        let shape = if graph.roots.contains_key(&NodeKey::of(*node)) {
            ", shape=box"
        } else {
            ""
        };
        out.push_str(&format!(
            "  node{} [label=\"{}\"{}]\n",
            i,
            escape(&node.label()),
            shape
        ));
    }
    for (i, node) in graph.order.iter().enumerate() {
        for operand in node.operands() {
            let from = graph.position(operand.node());
            match operand.index() {
                0 => out.push_str(&format!("  node{} -> node{}\n", from, i)),
                k => out.push_str(&format!("  node{} -> node{} [label=\"o={}\"]\n", from, i, k)),
            }
        }
    }
    out.push_str("}\n");
    Ok(out)
}

/// Render in the requested format.
pub fn render<'a, N, I>(roots: I, format: DumpFormat, graph_name: &str) -> TraversalResult<String>
where
    N: IrNode + 'a,
    I: IntoIterator<Item = &'a N>,
{
    match format {
        DumpFormat::Text => to_text(roots),
        DumpFormat::Dot => to_dot(roots, graph_name),
    }
}

fn escape(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
