//! Graphviz DOT export implementation.
//!
//! Projects the package set onto a `petgraph` graph and writes it with
//! [`petgraph::dot::Dot`]. Labels and styling come from attribute getters
//! rather than from the node and edge weights.

use super::{ExportData, Exporter};
use crate::graph::{GraphEdge, GraphNode};
use crate::version::WILDCARD;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use std::io::{self, Write};

/// DOT exporter implementation.
pub struct DotExporter;

type PackageGraph = DiGraph<GraphNode, GraphEdge>;

/// Escapes a string for use inside a quoted DOT attribute.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn node_attributes(_: &PackageGraph, (_, node): (NodeIndex, &GraphNode)) -> String {
    match &node.version {
        Some(version) => {
            let label = format!("{}\\n{}", escape(&node.name), escape(version));
            if node.conflicted {
                format!("label = \"{}\" color = red fontcolor = red ", label)
            } else {
                format!("label = \"{}\" ", label)
            }
        }
        None => format!("label = \"{}\" style = dashed ", escape(&node.name)),
    }
}

fn edge_attributes(graph: &PackageGraph, edge: EdgeReference<'_, GraphEdge>) -> String {
    let target_missing = !graph[edge.target()].is_installed();
    let mut attrs = String::new();
    if edge.weight().constraint != WILDCARD {
        attrs.push_str(&format!(
            "label = \">={}\" ",
            escape(&edge.weight().constraint)
        ));
    }
    if target_missing {
        attrs.push_str("style = dashed ");
    }
    attrs
}

impl Exporter for DotExporter {
    fn export<W: Write>(&self, data: &ExportData<'_>, writer: &mut W) -> io::Result<()> {
        let graph = data.packages.to_digraph();
        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &edge_attributes,
            &node_attributes,
        );
        writeln!(writer, "// {}", data.environment.display())?;
        write!(writer, "{}", dot)
    }
}
