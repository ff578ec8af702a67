//! IR 模块单元测试
//!
//! Nodes, graph files and dumps.

use crate::ir::dump::{render, to_dot, to_text, DumpFormat};
use crate::ir::graph::{Graph, GraphDef, GraphError, GraphFormat, NodeDef};
use crate::ir::node::{IrNode, Node, OpKind, Operand, Output};
use crate::ir::node_id::{NodeId, NodeIdGenerator};
use crate::ir::traversal::TraversalError;

const DIAMOND: &str = r#"(
    nodes: [
        (name: "leaf", op: "lazy::device_data"),
        (name: "l", op: "aten::neg", operands: ["leaf"]),
        (name: "r", op: "aten::exp", operands: ["leaf"]),
        (name: "top", op: "aten::add", operands: ["l", "r"]),
    ],
    roots: ["top"],
)"#;

fn diamond() -> Graph {
    Graph::parse(DIAMOND, GraphFormat::Ron).unwrap()
}

fn node_def(name: &str, op: &str, operands: &[&str]) -> NodeDef {
    NodeDef {
        name: name.to_string(),
        op: op.to_string(),
        operands: operands.iter().map(|s| s.to_string()).collect(),
        num_outputs: 1,
    }
}

#[cfg(test)]
mod node_id_tests {
    use super::*;

    #[test]
    fn test_node_id_new() {
        let id = NodeId::new(1);
        assert_eq!(id.value(), 1);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(42).to_string(), "#42");
    }

    #[test]
    fn test_generator_is_sequential() {
        let generator = NodeIdGenerator::new();
        assert_eq!(generator.generate(), NodeId(0));
        assert_eq!(generator.generate(), NodeId(1));
        assert_eq!(generator.issued(), 2);
    }
}

#[cfg(test)]
mod node_tests {
    use super::*;

    #[test]
    fn test_leaf() {
        let x = Node::leaf("lazy::device_data");
        assert!(x.is_leaf());
        assert_eq!(x.num_outputs(), 1);
        assert_eq!(x.num_operands(), 0);
        assert_eq!(x.op(), &OpKind::new("lazy::device_data"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Node::leaf("a");
        let b = Node::leaf("a");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_operand_edges() {
        let split = Node::new("aten::split", std::iter::empty::<Output>(), 2);
        let cat = Node::new(
            "aten::cat",
            [Output::new(split.clone(), 1), Output::from(split.clone())],
            1,
        );
        let operands = cat.operands();
        assert_eq!(operands.len(), 2);
        assert_eq!(operands[0].index(), 1);
        assert_eq!(operands[1].index(), 0);
        assert!(std::ptr::eq(operands[0].node(), &*split));
        assert!(std::sync::Arc::ptr_eq(operands[1].producer(), &split));
    }

    #[test]
    fn test_display_and_label() {
        let split = Node::new("aten::split", std::iter::empty::<Output>(), 2);
        let text = split.to_string();
        assert!(text.starts_with("aten::split #"));
        assert!(text.ends_with(", num_outputs=2"));
        assert_eq!(split.label(), "aten::split");
    }

    #[test]
    fn test_debug_lists_operand_ids() {
        let x = Node::leaf("x");
        let y = Node::new("y", [Output::from(x.clone())], 1);
        let debug = format!("{:?}", y);
        assert!(debug.contains(&format!("{}.0", x.id())));
    }

    #[test]
    fn test_shared_operand_survives_consumer_drop() {
        let x = Node::leaf("x");
        let y = Node::new("y", [Output::from(x.clone())], 1);
        drop(y);
        assert_eq!(std::sync::Arc::strong_count(&x), 1);
    }
}

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn test_parse_ron() {
        let graph = diamond();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.roots().count(), 1);
        let names: Vec<&str> = graph.nodes().map(|(name, _)| name).collect();
        assert_eq!(names, ["leaf", "l", "r", "top"]);
        assert_eq!(graph.size().unwrap(), 4);
    }

    #[test]
    fn test_parse_json() {
        let source = r#"{
            "nodes": [
                {"name": "x", "op": "lazy::device_data"},
                {"name": "y", "op": "aten::neg", "operands": ["x"]}
            ],
            "roots": ["y"]
        }"#;
        let graph = Graph::parse(source, GraphFormat::Json).unwrap();
        let order = graph.post_order().unwrap();
        assert_eq!(order.len(), 2);
        assert!(std::ptr::eq(order[0], &**graph.node("x").unwrap()));
    }

    #[test]
    fn test_default_roots_are_unconsumed_nodes() {
        let def = GraphDef {
            nodes: vec![
                node_def("x", "lazy::device_data", &[]),
                node_def("a", "aten::neg", &["x"]),
                node_def("b", "aten::exp", &["x"]),
            ],
            roots: Vec::new(),
        };
        let graph = Graph::from_def(&def).unwrap();
        let roots: Vec<&str> = graph.roots().map(|n| n.op().as_str()).collect();
        assert_eq!(roots, ["aten::neg", "aten::exp"]);
    }

    #[test]
    fn test_output_index_reference() {
        let mut split = node_def("s", "aten::split", &[]);
        split.num_outputs = 2;
        let def = GraphDef {
            nodes: vec![split, node_def("c", "aten::cat", &["s:1", "s"])],
            roots: vec!["c".to_string()],
        };
        let graph = Graph::from_def(&def).unwrap();
        let cat = graph.node("c").unwrap();
        let indices: Vec<usize> = cat.operands().iter().map(|o| o.index()).collect();
        assert_eq!(indices, [1, 0]);
    }

    #[test]
    fn test_qualified_names_are_not_indices() {
        let def = GraphDef {
            nodes: vec![
                node_def("ns::x", "lazy::device_data", &[]),
                node_def("y", "aten::neg", &["ns::x"]),
            ],
            roots: Vec::new(),
        };
        assert!(Graph::from_def(&def).is_ok());
    }

    #[test]
    fn test_duplicate_node() {
        let def = GraphDef {
            nodes: vec![node_def("x", "a", &[]), node_def("x", "b", &[])],
            roots: Vec::new(),
        };
        assert!(matches!(
            Graph::from_def(&def),
            Err(GraphError::DuplicateNode(name)) if name == "x"
        ));
    }

    #[test]
    fn test_forward_reference_is_unknown() {
        // Only earlier nodes can be referenced, so loops cannot be written.
        let def = GraphDef {
            nodes: vec![node_def("a", "a", &["b"]), node_def("b", "b", &["a"])],
            roots: Vec::new(),
        };
        let err = Graph::from_def(&def).unwrap_err();
        assert_eq!(err.to_string(), "Node `a` refers to unknown operand `b`");
    }

    #[test]
    fn test_output_out_of_range() {
        let def = GraphDef {
            nodes: vec![node_def("x", "a", &[]), node_def("y", "b", &["x:1"])],
            roots: Vec::new(),
        };
        assert!(matches!(
            Graph::from_def(&def),
            Err(GraphError::OutputOutOfRange { index: 1, num_outputs: 1, .. })
        ));
    }

    #[test]
    fn test_malformed_operand() {
        let def = GraphDef {
            nodes: vec![node_def("x", "a", &[]), node_def("y", "b", &["x:"])],
            roots: Vec::new(),
        };
        assert!(matches!(
            Graph::from_def(&def),
            Err(GraphError::BadOperand { .. })
        ));
    }

    #[test]
    fn test_unknown_root() {
        let def = GraphDef {
            nodes: vec![node_def("x", "a", &[])],
            roots: vec!["nope".to_string()],
        };
        assert!(matches!(
            Graph::from_def(&def),
            Err(GraphError::UnknownRoot(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Graph::parse("(nodes: [", GraphFormat::Ron),
            Err(GraphError::Ron(_))
        ));
        assert!(matches!(
            Graph::parse("{", GraphFormat::Json),
            Err(GraphError::Json(_))
        ));
    }

    #[test]
    fn test_format_from_path() {
        use std::path::Path;
        assert_eq!(GraphFormat::from_path(Path::new("g.ron")), Some(GraphFormat::Ron));
        assert_eq!(GraphFormat::from_path(Path::new("g.json")), Some(GraphFormat::Json));
        assert_eq!(GraphFormat::from_path(Path::new("g.txt")), None);
        assert_eq!(GraphFormat::from_path(Path::new("g")), None);
    }
}

#[cfg(test)]
mod dump_tests {
    use super::*;

    #[test]
    fn test_text_dump() {
        let graph = diamond();
        let text = to_text(graph.roots()).unwrap();
        assert_eq!(
            text,
            "IR {\n\
             \x20 %0 = lazy::device_data\n\
             \x20 %1 = aten::neg(%0)\n\
             \x20 %2 = aten::exp(%0)\n\
             \x20 %3 = aten::add(%1, %2), ROOT=0\n\
             }\n"
        );
    }

    #[test]
    fn test_dot_dump() {
        let graph = diamond();
        let dot = to_dot(graph.roots(), "step_0").unwrap();
        let expected = [
            "digraph \"step_0\" {",
            "  node0 [label=\"lazy::device_data\"]",
            "  node1 [label=\"aten::neg\"]",
            "  node2 [label=\"aten::exp\"]",
            "  node3 [label=\"aten::add\", shape=box]",
            "  node0 -> node1",
            "  node0 -> node2",
            "  node1 -> node3",
            "  node2 -> node3",
            "}",
        ];
        assert_eq!(dot.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_multi_output_operands() {
        let split = Node::new("aten::split", std::iter::empty::<Output>(), 2);
        let cat = Node::new(
            "aten::cat",
            [Output::new(split.clone(), 1), Output::from(split.clone())],
            1,
        );
        let text = to_text([&*cat]).unwrap();
        assert!(text.contains("%1 = aten::cat(%0.1, %0), ROOT=0"));
        let dot = to_dot([&*cat], "g").unwrap();
        assert!(dot.contains("node0 -> node1 [label=\"o=1\"]"));
        assert!(dot.contains("node0 -> node1\n"));
    }

    #[test]
    fn test_root_slots_follow_caller_order() {
        let x = Node::leaf("x");
        let a = Node::new("a", [Output::from(x.clone())], 1);
        let b = Node::new("b", [Output::from(x.clone())], 1);
        let text = to_text([&*b, &*a, &*b]).unwrap();
        assert!(text.contains("%1 = b(%0), ROOT=0"));
        assert!(text.contains("%2 = a(%0), ROOT=1"));
    }

    #[test]
    fn test_labels_are_escaped() {
        let odd = Node::leaf("say \"hi\"");
        let dot = to_dot([&*odd], "a\\b").unwrap();
        assert!(dot.starts_with("digraph \"a\\\\b\" {"));
        assert!(dot.contains("label=\"say \\\"hi\\\"\""));
    }

    #[test]
    fn test_render_dispatch() {
        let graph = diamond();
        let text = render(graph.roots(), DumpFormat::Text, "g").unwrap();
        assert!(text.starts_with("IR {"));
        let dot = render(graph.roots(), DumpFormat::Dot, "g").unwrap();
        assert!(dot.starts_with("digraph \"g\""));
    }

    #[test]
    fn test_dump_format_parse() {
        assert_eq!("dot".parse::<DumpFormat>(), Ok(DumpFormat::Dot));
        assert_eq!("TEXT".parse::<DumpFormat>(), Ok(DumpFormat::Text));
        assert!("svg".parse::<DumpFormat>().is_err());
        assert_eq!(DumpFormat::Dot.to_string(), "dot");
    }

    #[test]
    fn test_empty_dump() {
        assert_eq!(to_text(Vec::<&Node>::new()).unwrap(), "IR {\n}\n");
    }

    #[test]
    fn test_dump_refuses_loops() {
        use std::cell::OnceCell;
        use std::fmt;

        struct Looped {
            operands: OnceCell<Vec<&'static Looped>>,
        }

        impl fmt::Display for Looped {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("looped")
            }
        }

        impl IrNode for Looped {
            type Operand = &'static Looped;

            fn operands(&self) -> &[&'static Looped] {
                self.operands.get().map(Vec::as_slice).unwrap_or(&[])
            }
        }

        let node: &'static Looped = Box::leak(Box::new(Looped {
            operands: OnceCell::new(),
        }));
        let _ = node.operands.set(vec![node]);

        assert!(matches!(
            to_text([node]),
            Err(TraversalError::GraphLoop { .. })
        ));
    }
}
