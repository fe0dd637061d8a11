// src/graph/render.rs
// =============================================================================
// Serializes a Graph for other tools.
//
// - DOT: a Graphviz digraph, one node per user (labelled with the username,
//   with the user id as its `id` attribute) and one edge per connection. `dot -Tsvg relationships.dot` draws it.
// - JSON: the node map as-is, for scripts and other visualizers.
// =============================================================================

use super::builder::Graph;
use crate::api::UserId;
use anyhow::Result;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;

/// Render the graph as a Graphviz DOT document
pub fn to_dot(graph: &Graph) -> String {
    // Node weight: (user id, display label)
    let mut digraph: DiGraph<(&UserId, String), ()> = DiGraph::new();
    let mut index: BTreeMap<&UserId, NodeIndex> = BTreeMap::new();

    for (id, node) in graph.nodes() {
        let from = node_index(&mut digraph, &mut index, graph, id);
        for neighbor in &node.neighbors {
            let to = node_index(&mut digraph, &mut index, graph, neighbor);
            digraph.add_edge(from, to, ());
        }
    }

    let dot = Dot::with_attr_getters(
        &digraph,
        &[Config::EdgeNoLabel, Config::NodeNoLabel],
        &|_, _| String::new(),
        // petgraph names nodes by index; the id attribute keeps them traceable
        &|_, (_, (id, label))| {
            format!("label = \"{}\" id = \"{}\" ", escape(label), escape(id.as_str()))
        },
    );

    // petgraph has no hook for graph attributes; merge parallel edges the way
    // Graphviz users expect from this tool
    format!("{:?}", dot).replacen("digraph {\n", "digraph {\n    concentrate=true\n", 1)
}

/// Render the graph as pretty-printed JSON
pub fn to_json(graph: &Graph) -> Result<String> {
    Ok(serde_json::to_string_pretty(graph)?)
}

fn node_index<'a>(
    digraph: &mut DiGraph<(&'a UserId, String), ()>,
    index: &mut BTreeMap<&'a UserId, NodeIndex>,
    graph: &Graph,
    id: &'a UserId,
) -> NodeIndex {
    *index.entry(id).or_insert_with(|| {
        let label = graph.label(id).unwrap_or(id.as_str());
        digraph.add_node((id, label.to_string()))
    })
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
